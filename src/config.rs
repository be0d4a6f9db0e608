use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::visualizer::engine::EngineSettings;
use crate::visualizer::frame::Palette;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub visualizer: VisualizerConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize)]
pub struct VisualizerConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_window_ms")]
    pub window_ms: u32,
    #[serde(default = "default_full_scale")]
    pub full_scale: f32,
    #[serde(default)]
    pub palette: Palette,
    #[serde(default = "default_y_limit")]
    pub y_limit: f32,
    #[serde(default = "default_columns")]
    pub columns: usize,
}

#[derive(Debug, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player")]
    pub program: String,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_duration")]
    pub default_duration: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            window_ms: default_window_ms(),
            full_scale: default_full_scale(),
            palette: Palette::default(),
            y_limit: default_y_limit(),
            columns: default_columns(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            program: default_player(),
            extra_args: Vec::new(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe: default_ffprobe(),
            ffmpeg: default_ffmpeg(),
            default_duration: default_duration(),
        }
    }
}

impl VisualizerConfig {
    /// Engine settings with unusable values replaced by their defaults.
    pub fn engine_settings(&self) -> EngineSettings {
        let window_ms = if self.window_ms == 0 {
            log::warn!("visualizer.window_ms must be positive, using {}", default_window_ms());
            default_window_ms()
        } else {
            self.window_ms
        };
        let full_scale = if self.full_scale.is_finite() && self.full_scale > 0.0 {
            self.full_scale
        } else {
            log::warn!(
                "visualizer.full_scale must be a positive number, got {}; using {}",
                self.full_scale,
                default_full_scale()
            );
            default_full_scale()
        };
        EngineSettings {
            tick_interval: Duration::from_millis(self.tick_ms.max(1)),
            window_ms,
            full_scale,
            palette: self.palette.clone(),
        }
    }
}

pub fn default_tick_ms() -> u64 { 19 }
fn default_window_ms() -> u32 { 20 }
fn default_full_scale() -> f32 { 30000.0 }
fn default_y_limit() -> f32 { 2.0 }
pub fn default_columns() -> usize { 64 }
pub fn default_player() -> String { "ffplay".into() }
fn default_ffprobe() -> String { "ffprobe".into() }
fn default_ffmpeg() -> String { "ffmpeg".into() }
fn default_duration() -> u64 { 100 }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Invalid config {}: {}", path.display(), err);
            None
        }
    }
}

/// `./pulseplay.toml`, then `~/.config/pulseplay/config.toml`, then the
/// platform config dir.
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from("pulseplay.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("pulseplay").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("pulseplay").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.visualizer.tick_ms, 19);
        assert_eq!(config.visualizer.window_ms, 20);
        assert_eq!(config.visualizer.full_scale, 30000.0);
        assert_eq!(config.visualizer.palette, Palette::default());
        assert_eq!(config.player.program, "ffplay");
        assert_eq!(config.probe.default_duration, 100);
        assert!(config.cache.dir.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [visualizer]
            tick_ms = 40
            palette = { mid = [0, 255, 0] }

            [player]
            program = "mpv"
            extra_args = ["--no-video"]

            [cache]
            dir = "/tmp/pp"
            "#,
        )
        .unwrap();
        assert_eq!(config.visualizer.tick_ms, 40);
        assert_eq!(config.visualizer.palette.mid, [0, 255, 0]);
        assert_eq!(config.visualizer.palette.low, [0, 0, 255]);
        assert_eq!(config.visualizer.columns, 64);
        assert_eq!(config.player.program, "mpv");
        assert_eq!(config.player.extra_args, vec!["--no-video"]);
        assert_eq!(config.probe.ffprobe, "ffprobe");
        assert_eq!(config.cache.dir, Some(PathBuf::from("/tmp/pp")));
    }

    #[test]
    fn engine_settings_follow_visualizer_section() {
        let mut visualizer = VisualizerConfig::default();
        visualizer.full_scale = 1000.0;
        let settings = visualizer.engine_settings();
        assert_eq!(settings.tick_interval, Duration::from_millis(19));
        assert_eq!(settings.full_scale, 1000.0);
        assert_eq!(settings.window_ms, 20);
    }

    #[test]
    fn engine_settings_replace_unusable_values() {
        let mut visualizer = VisualizerConfig::default();
        visualizer.tick_ms = 0;
        visualizer.window_ms = 0;
        visualizer.full_scale = 0.0;
        let settings = visualizer.engine_settings();
        assert_eq!(settings.tick_interval, Duration::from_millis(1));
        assert_eq!(settings.window_ms, 20);
        assert_eq!(settings.full_scale, 30000.0);

        visualizer.full_scale = -5.0;
        assert_eq!(visualizer.engine_settings().full_scale, 30000.0);
        visualizer.full_scale = f32::NAN;
        assert_eq!(visualizer.engine_settings().full_scale, 30000.0);
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulseplay.toml");
        std::fs::write(&path, "[probe]\ndefault_duration = 5\n").unwrap();
        assert_eq!(load_config(&path).unwrap().probe.default_duration, 5);
        std::fs::write(&path, "[probe\n").unwrap();
        assert!(load_config(&path).is_none());
    }
}
