use serde::Deserialize;

pub type Rgb = [u8; 3];

/// Coarse dynamics label derived from a spectrum's range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorGrade {
    Low,
    Mid,
    High,
}

impl ColorGrade {
    /// 0, 1 and 2 pick low, mid and high; anything else falls back to low.
    pub fn from_spread(spread: i64) -> Self {
        match spread {
            0 => ColorGrade::Low,
            1 => ColorGrade::Mid,
            2 => ColorGrade::High,
            _ => ColorGrade::Low,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Palette {
    #[serde(default = "default_low")]
    pub low: Rgb,
    #[serde(default = "default_mid")]
    pub mid: Rgb,
    #[serde(default = "default_high")]
    pub high: Rgb,
}

impl Palette {
    pub fn color(&self, grade: ColorGrade) -> Rgb {
        match grade {
            ColorGrade::Low => self.low,
            ColorGrade::Mid => self.mid,
            ColorGrade::High => self.high,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            low: default_low(),
            mid: default_mid(),
            high: default_high(),
        }
    }
}

fn default_low() -> Rgb { [0, 0, 255] }
fn default_mid() -> Rgb { [255, 255, 0] }
fn default_high() -> Rgb { [255, 0, 0] }

/// One rendered visualization step. The frequency axis is fixed per track
/// and lives on the engine, not here.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// `transform_size` non-negative magnitudes
    pub magnitudes: Vec<f32>,
    pub grade: ColorGrade,
    pub color: Rgb,
}

impl Frame {
    pub fn new(magnitudes: Vec<f32>, grade: ColorGrade, palette: &Palette) -> Self {
        Self {
            magnitudes,
            grade,
            color: palette.color(grade),
        }
    }

    pub fn silent(bins: usize, palette: &Palette) -> Self {
        Self::new(vec![0.0; bins], ColorGrade::Low, palette)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_maps_to_grades_in_order() {
        assert_eq!(ColorGrade::from_spread(0), ColorGrade::Low);
        assert_eq!(ColorGrade::from_spread(1), ColorGrade::Mid);
        assert_eq!(ColorGrade::from_spread(2), ColorGrade::High);
    }

    #[test]
    fn out_of_range_spread_defaults_to_low() {
        assert_eq!(ColorGrade::from_spread(3), ColorGrade::Low);
        assert_eq!(ColorGrade::from_spread(250), ColorGrade::Low);
        assert_eq!(ColorGrade::from_spread(-1), ColorGrade::Low);
    }

    #[test]
    fn frame_takes_palette_color() {
        let palette = Palette {
            low: [1, 1, 1],
            mid: [2, 2, 2],
            high: [3, 3, 3],
        };
        let frame = Frame::new(vec![0.5], ColorGrade::High, &palette);
        assert_eq!(frame.color, [3, 3, 3]);
        let silent = Frame::silent(4, &palette);
        assert_eq!(silent.magnitudes, vec![0.0; 4]);
        assert_eq!(silent.color, [1, 1, 1]);
    }
}
