use std::path::Path;
use std::process::{Command, Output, Stdio};

use crate::error::ToolError;

/// Track metadata that comes from outside the decoder. Implementations fail
/// soft: errors are logged and replaced by a default.
pub trait MetadataProvider {
    /// Whole seconds, or a configured default when probing fails.
    fn duration(&self, path: &Path) -> u64;
    /// Embedded cover image bytes, if any.
    fn cover_image(&self, path: &Path) -> Option<Vec<u8>>;
}

pub struct FfmpegTools {
    ffprobe: String,
    ffmpeg: String,
    default_duration: u64,
}

impl FfmpegTools {
    pub fn new(ffprobe: impl Into<String>, ffmpeg: impl Into<String>, default_duration: u64) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            ffmpeg: ffmpeg.into(),
            default_duration,
        }
    }

    fn probe_duration(&self, path: &Path) -> Result<u64, ToolError> {
        let input = path.to_string_lossy().into_owned();
        let output = run(
            &self.ffprobe,
            &[
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                input.as_str(),
            ],
        )?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_duration(&stdout).ok_or_else(|| ToolError::Output {
            tool: self.ffprobe.clone(),
            output: stdout.into_owned(),
        })
    }

    fn extract_cover(&self, path: &Path) -> Result<Vec<u8>, ToolError> {
        let input = path.to_string_lossy().into_owned();
        let output = run(
            &self.ffmpeg,
            &[
                "-v",
                "error",
                "-i",
                input.as_str(),
                "-an",
                "-vcodec",
                "copy",
                "-f",
                "image2pipe",
                "-",
            ],
        )?;
        if output.stdout.is_empty() {
            return Err(ToolError::Output {
                tool: self.ffmpeg.clone(),
                output: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(output.stdout)
    }
}

impl MetadataProvider for FfmpegTools {
    fn duration(&self, path: &Path) -> u64 {
        match self.probe_duration(path) {
            Ok(secs) => {
                log::info!("Duration of {}: {}s", path.display(), secs);
                secs
            }
            Err(err) => {
                log::warn!(
                    "Could not probe duration ({}), assuming {}s",
                    err,
                    self.default_duration
                );
                self.default_duration
            }
        }
    }

    fn cover_image(&self, path: &Path) -> Option<Vec<u8>> {
        match self.extract_cover(path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                log::warn!("No cover art for {}: {}", path.display(), err);
                None
            }
        }
    }
}

fn run(tool: &str, args: &[&str]) -> Result<Output, ToolError> {
    let output = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| ToolError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            tool: tool.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

/// First line of ffprobe's bare `format=duration` output, truncated to seconds.
pub fn parse_duration(stdout: &str) -> Option<u64> {
    let secs: f64 = stdout.lines().next()?.trim().parse().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(secs as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ffprobe_duration() {
        assert_eq!(parse_duration("215.712653\n"), Some(215));
        assert_eq!(parse_duration("  3.999 \nextra"), Some(3));
        assert_eq!(parse_duration("0.0"), Some(0));
    }

    #[test]
    fn rejects_unusable_duration() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("N/A\n"), None);
        assert_eq!(parse_duration("-4.0"), None);
        assert_eq!(parse_duration("inf"), None);
    }

    #[test]
    fn missing_tools_fall_back_to_defaults() {
        let tools = FfmpegTools::new("/nonexistent/ffprobe", "/nonexistent/ffmpeg", 100);
        let path = Path::new("song.mp3");
        assert_eq!(tools.duration(path), 100);
        assert_eq!(tools.cover_image(path), None);
        assert!(matches!(
            tools.probe_duration(path),
            Err(ToolError::Spawn { .. })
        ));
    }
}
