use indicatif::{ProgressBar, ProgressStyle};

use crate::visualizer::frame::{Frame, Rgb};

/// Consumes visualization frames and position updates.
pub trait Renderer {
    fn draw(&mut self, axis: &[f32], frame: &Frame);
    fn status(&mut self, playing_time: u64, label: &str);
    fn finish(&mut self);
}

const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Progress bar with a one-line coloured spectrum above it.
pub struct TerminalRenderer {
    bar: ProgressBar,
    columns: usize,
    y_limit: f32,
    axis_range: Option<(f32, f32)>,
}

impl TerminalRenderer {
    pub fn new(duration: u64, columns: usize, y_limit: f32) -> Self {
        let bar = ProgressBar::new(duration);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{prefix:>12} {bar:40.cyan/blue}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self::with_bar(bar, columns, y_limit)
    }

    pub fn with_bar(bar: ProgressBar, columns: usize, y_limit: f32) -> Self {
        Self {
            bar,
            columns: columns.max(1),
            y_limit,
            axis_range: None,
        }
    }

    #[cfg(test)]
    fn message(&self) -> String {
        self.bar.message()
    }
}

impl Renderer for TerminalRenderer {
    fn draw(&mut self, axis: &[f32], frame: &Frame) {
        if let (Some(&lo), Some(&hi)) = (axis.first(), axis.last()) {
            if self.axis_range != Some((lo, hi)) {
                log::debug!("Spectrum axis {:.0} Hz .. {:.0} Hz, {} bins", lo, hi, axis.len());
                self.axis_range = Some((lo, hi));
            }
        }
        let line = sparkline(&frame.magnitudes, self.columns, self.y_limit);
        self.bar.set_message(paint(&line, frame.color));
    }

    fn status(&mut self, playing_time: u64, label: &str) {
        self.bar.set_position(playing_time);
        self.bar.set_prefix(label.to_string());
    }

    fn finish(&mut self) {
        self.bar.finish();
    }
}

/// Bucket `magnitudes` into `columns` cells (peak per cell) and draw each as a
/// block glyph scaled against `y_limit`.
pub fn sparkline(magnitudes: &[f32], columns: usize, y_limit: f32) -> String {
    if magnitudes.is_empty() || columns == 0 {
        return String::new();
    }
    let cells = columns.min(magnitudes.len());
    (0..cells)
        .map(|c| {
            let from = c * magnitudes.len() / cells;
            let to = ((c + 1) * magnitudes.len() / cells).max(from + 1);
            let peak = magnitudes[from..to].iter().copied().fold(0.0f32, f32::max);
            let level = if y_limit > 0.0 { (peak / y_limit).clamp(0.0, 1.0) } else { 0.0 };
            LEVELS[((level * (LEVELS.len() - 1) as f32).round()) as usize]
        })
        .collect()
}

fn paint(text: &str, color: Rgb) -> String {
    format!("\x1b[38;2;{};{};{}m{}\x1b[0m", color[0], color[1], color[2], text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualizer::frame::{ColorGrade, Palette};

    #[test]
    fn sparkline_scales_against_limit() {
        assert_eq!(sparkline(&[0.0, 1.0, 2.0, 5.0], 4, 2.0), "▁▅██");
        assert_eq!(sparkline(&[], 8, 2.0), "");
    }

    #[test]
    fn sparkline_buckets_by_peak() {
        let mags = [0.0, 2.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(sparkline(&mags, 3, 2.0), "█▁▁");
        assert_eq!(sparkline(&mags, 100, 2.0).chars().count(), 6);
    }

    #[test]
    fn draw_paints_frame_color() {
        let mut renderer = TerminalRenderer::with_bar(ProgressBar::hidden(), 4, 2.0);
        let frame = Frame::new(vec![2.0; 8], ColorGrade::High, &Palette::default());
        renderer.draw(&[-100.0, 100.0], &frame);
        assert_eq!(renderer.message(), "\x1b[38;2;255;0;0m████\x1b[0m");
    }
}
