use rustfft::{num_complex::Complex, FftPlanner};

/// Retained transform bins are `window_size / TRANSFORM_DIVISOR`.
pub const TRANSFORM_DIVISOR: usize = 8;

/// Analysis geometry derived from a track's sample rate.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisWindow {
    pub sample_rate: u32,
    /// Samples covering one analysis window
    pub window_size: usize,
    /// Number of magnitude bins kept per frame
    pub transform_size: usize,
    /// `transform_size` points spanning -sample_rate/2 ..= sample_rate/2
    pub frequency_axis: Vec<f32>,
}

impl AnalysisWindow {
    pub fn new(sample_rate: u32, window_ms: u32) -> Self {
        let window_size = (sample_rate as u64 * window_ms as u64 / 1000) as usize;
        let transform_size = window_size / TRANSFORM_DIVISOR;
        let half = sample_rate as f32 / 2.0;
        Self {
            sample_rate,
            window_size,
            transform_size,
            frequency_axis: linspace(-half, half, transform_size),
        }
    }

    /// Seconds of audio one window spans; the cursor advances by this per tick.
    pub fn step_secs(&self) -> f64 {
        self.window_size as f64 / self.sample_rate as f64
    }
}

/// Evenly spaced values from `start` to `end`, both inclusive.
pub fn linspace(start: f32, end: f32, n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f32;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f32 })
                .collect()
        }
    }
}

/// Magnitude spectrum over a whole slice, truncated to the first
/// `transform_size` bins and scaled by `1 / transform_size`.
///
/// The transform runs over the full slice length and simply drops everything
/// past `transform_size`; colour grading thresholds depend on this scaling.
pub struct SpectrumAnalyzer {
    planner: FftPlanner<f32>,
    buffer: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            buffer: Vec::new(),
        }
    }

    pub fn magnitudes(&mut self, samples: &[f32], transform_size: usize) -> Vec<f32> {
        if samples.is_empty() || transform_size == 0 {
            return vec![0.0; transform_size];
        }

        self.buffer.clear();
        self.buffer
            .extend(samples.iter().map(|&s| Complex::new(s, 0.0)));

        // The planner caches plans, so the handful of slice lengths seen
        // during playback are only planned once.
        let fft = self.planner.plan_fft_forward(self.buffer.len());
        fft.process(&mut self.buffer);

        let scale = transform_size as f32;
        let mut magnitudes: Vec<f32> = self
            .buffer
            .iter()
            .take(transform_size)
            .map(|c| c.norm() / scale)
            .collect();
        magnitudes.resize(transform_size, 0.0);
        magnitudes
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// `floor(max - min)` of a spectrum; 0 for an empty one.
pub fn spread(magnitudes: &[f32]) -> i64 {
    if magnitudes.is_empty() {
        return 0;
    }
    let max = magnitudes.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let min = magnitudes.iter().copied().fold(f32::INFINITY, f32::min);
    (max - min).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_geometry_at_cd_rate() {
        let w = AnalysisWindow::new(44100, 20);
        assert_eq!(w.window_size, 882);
        assert_eq!(w.transform_size, 110);
        assert_eq!(w.frequency_axis.len(), 110);
        assert_eq!(w.frequency_axis[0], -22050.0);
        assert_eq!(w.frequency_axis[109], 22050.0);
        assert!((w.step_secs() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn transform_size_is_an_eighth_of_window_for_common_rates() {
        for rate in [8000, 11025, 22050, 32000, 44100, 48000, 96000] {
            let w = AnalysisWindow::new(rate, 20);
            assert_eq!(w.transform_size, w.window_size / 8);
            assert_eq!(w.frequency_axis.len(), w.transform_size);
        }
    }

    #[test]
    fn linspace_edges() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert_eq!(linspace(-1.0, 1.0, 5), vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn silence_has_flat_zero_spectrum() {
        let mut analyzer = SpectrumAnalyzer::new();
        let mags = analyzer.magnitudes(&vec![0.0; 1764], 110);
        assert_eq!(mags.len(), 110);
        assert!(mags.iter().all(|&m| m == 0.0));
        assert_eq!(spread(&mags), 0);
    }

    #[test]
    fn dc_offset_lands_in_first_bin() {
        let mut analyzer = SpectrumAnalyzer::new();
        // 64 samples of 0.5 -> DC coefficient 32, scaled by 1/8 -> 4
        let mags = analyzer.magnitudes(&vec![0.5; 64], 8);
        assert_eq!(mags.len(), 8);
        assert!((mags[0] - 4.0).abs() < 1e-4);
        assert!(mags[1..].iter().all(|&m| m.abs() < 1e-4));
    }

    #[test]
    fn magnitudes_are_never_negative() {
        let mut analyzer = SpectrumAnalyzer::new();
        let samples: Vec<f32> = (0..256)
            .map(|i| ((i * 37 % 101) as f32 - 50.0) / 40.0)
            .collect();
        let mags = analyzer.magnitudes(&samples, 32);
        assert_eq!(mags.len(), 32);
        assert!(mags.iter().all(|&m| m >= 0.0));
    }

    #[test]
    fn spread_floors_the_range() {
        assert_eq!(spread(&[]), 0);
        assert_eq!(spread(&[0.2, 1.1]), 0);
        assert_eq!(spread(&[0.0, 1.0]), 1);
        assert_eq!(spread(&[0.5, 3.4]), 2);
        assert_eq!(spread(&[0.0, 7.9]), 7);
    }
}
