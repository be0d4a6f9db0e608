use std::time::Duration;

use crate::audio::decode::AudioTrack;
use crate::audio::spectrum::{self, AnalysisWindow, SpectrumAnalyzer};

use super::frame::{ColorGrade, Frame, Palette};
use super::scheduler::{Scheduler, TickToken};

#[derive(Clone, Debug)]
pub struct EngineSettings {
    /// Wall-clock refresh interval, independent of the analysis window
    pub tick_interval: Duration,
    /// Analysis window length in milliseconds
    pub window_ms: u32,
    /// Amplitudes are divided by this before the transform
    pub full_scale: f32,
    pub palette: Palette,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(19),
            window_ms: 20,
            full_scale: 30000.0,
            palette: Palette::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// A new frame was computed and the cursor advanced.
    Frame(Frame),
    /// Not enough samples around the cursor; nothing changed.
    Skipped,
    /// The token belongs to a stopped or superseded run; nothing changed.
    Stale,
}

/// Sliding-window spectrum visualizer synchronised to a playback position.
///
/// Idle until [`start`](Self::start); while running, every fire of the
/// scheduler's timer should be routed to [`tick`](Self::tick).
pub struct VisualizationEngine<S: Scheduler> {
    track: AudioTrack,
    window: AnalysisWindow,
    settings: EngineSettings,
    analyzer: SpectrumAnalyzer,
    scheduler: S,
    position_secs: f64,
    active: Option<TickToken>,
    frame: Frame,
}

impl<S: Scheduler> VisualizationEngine<S> {
    pub fn new(track: AudioTrack, settings: EngineSettings, scheduler: S) -> Self {
        let window = AnalysisWindow::new(track.sample_rate(), settings.window_ms);
        let frame = Frame::silent(window.transform_size, &settings.palette);
        log::debug!(
            "Visualizer window: {} samples, {} bins, step {:.4}s",
            window.window_size,
            window.transform_size,
            window.step_secs()
        );
        Self {
            track,
            window,
            settings,
            analyzer: SpectrumAnalyzer::new(),
            scheduler,
            position_secs: 0.0,
            active: None,
            frame,
        }
    }

    pub fn start(&mut self, position_secs: f64) {
        self.position_secs = position_secs;
        self.resume();
    }

    /// Start from wherever the cursor was left.
    pub fn resume(&mut self) {
        self.frame = Frame::silent(self.window.transform_size, &self.settings.palette);
        self.active = Some(self.scheduler.start(self.settings.tick_interval));
    }

    /// Halt ticking. The cursor is kept. Idempotent.
    pub fn stop(&mut self) {
        if self.active.take().is_some() {
            self.scheduler.stop();
        }
    }

    /// Seek: stop, then start at `position_secs`, so no tick from the old run
    /// can land after the new cursor is set.
    pub fn update(&mut self, position_secs: f64) {
        self.stop();
        self.start(position_secs);
    }

    pub fn tick(&mut self, token: TickToken) -> TickOutcome {
        if self.active != Some(token) {
            return TickOutcome::Stale;
        }

        let window_size = self.window.window_size;
        let span = window_size as i64;
        let total = self.track.total_samples() as i64;

        let mut start = (self.position_secs * self.window.sample_rate as f64).round() as i64;
        let mut end = start + span;
        // Widen by a window on each side that has room
        if start > 0 {
            start -= span;
        }
        if end < total {
            end += span;
        }

        let slice = self.track.slice(start, end);
        if slice.len() < window_size {
            log::trace!(
                "Skipping tick at {:.3}s: {} of {} samples available",
                self.position_secs,
                slice.len(),
                window_size
            );
            return TickOutcome::Skipped;
        }

        let full_scale = self.settings.full_scale;
        let normalized: Vec<f32> = slice.iter().map(|&s| s as f32 / full_scale).collect();
        let magnitudes = self
            .analyzer
            .magnitudes(&normalized, self.window.transform_size);
        let grade = ColorGrade::from_spread(spectrum::spread(&magnitudes));

        self.frame = Frame::new(magnitudes, grade, &self.settings.palette);
        self.position_secs += self.window.step_secs();

        TickOutcome::Frame(self.frame.clone())
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn position_secs(&self) -> f64 {
        self.position_secs
    }

    pub fn window(&self) -> &AnalysisWindow {
        &self.window
    }

    pub fn frequency_axis(&self) -> &[f32] {
        &self.window.frequency_axis
    }

    /// Most recent frame; all zeros right after a start.
    pub fn current_frame(&self) -> &Frame {
        &self.frame
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}
