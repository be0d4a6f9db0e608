use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const CACHE_FILE: &str = "MusicPlayerCache.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct ResumeEntry {
    #[serde(rename = "playingTime")]
    playing_time: u64,
}

/// Last playback position per track, persisted as a small JSON object keyed
/// by file name.
pub struct ResumeCache {
    path: PathBuf,
}

impl ResumeCache {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create cache dir: {}", dir.display()))?;
        Ok(Self {
            path: dir.join(CACHE_FILE),
        })
    }

    pub fn default_dir() -> Option<PathBuf> {
        dirs::cache_dir()
            .or_else(dirs::home_dir)
            .map(|base| base.join("pulseplay"))
    }

    /// Cache key for a track: its file name.
    pub fn key_for(track: &Path) -> String {
        track
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| track.to_string_lossy().into_owned())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        let position = self.read().get(key).map(|e| e.playing_time);
        if let Some(secs) = position {
            log::info!("Resume position for {}: {}s", key, secs);
        }
        position
    }

    pub fn set(&self, key: &str, secs: u64) -> Result<()> {
        let mut entries = self.read();
        entries.insert(key.to_string(), ResumeEntry { playing_time: secs });
        self.write(&entries)?;
        log::info!("Saved resume position for {}: {}s", key, secs);
        Ok(())
    }

    pub fn forget(&self, key: &str) -> Result<()> {
        let mut entries = self.read();
        if entries.remove(key).is_some() {
            self.write(&entries)?;
            log::info!("Forgot resume position for {}", key);
        }
        Ok(())
    }

    fn read(&self) -> BTreeMap<String, ResumeEntry> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(err) => {
                log::warn!("Failed to read {}: {}", self.path.display(), err);
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|err| {
            log::warn!("Ignoring corrupt cache {}: {}", self.path.display(), err);
            BTreeMap::new()
        })
    }

    fn write(&self, entries: &BTreeMap<String, ResumeEntry>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write cache: {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_positions_per_track() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResumeCache::open(dir.path()).unwrap();
        assert_eq!(cache.get("a.mp3"), None);

        cache.set("a.mp3", 42).unwrap();
        cache.set("b.flac", 7).unwrap();
        cache.set("a.mp3", 43).unwrap();

        let reopened = ResumeCache::open(dir.path()).unwrap();
        assert_eq!(reopened.get("a.mp3"), Some(43));
        assert_eq!(reopened.get("b.flac"), Some(7));
    }

    #[test]
    fn stores_original_json_shape() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResumeCache::open(dir.path()).unwrap();
        cache.set("song.mp3", 12).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(cache.path()).unwrap()).unwrap();
        assert_eq!(raw["song.mp3"]["playingTime"], 12);
    }

    #[test]
    fn corrupt_file_reads_as_empty_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResumeCache::open(dir.path()).unwrap();
        std::fs::write(cache.path(), "{not json").unwrap();

        assert_eq!(cache.get("x.wav"), None);
        cache.set("x.wav", 3).unwrap();
        assert_eq!(cache.get("x.wav"), Some(3));
    }

    #[test]
    fn forget_removes_only_that_track() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResumeCache::open(dir.path()).unwrap();
        cache.set("a", 1).unwrap();
        cache.set("b", 2).unwrap();
        cache.forget("a").unwrap();
        cache.forget("missing").unwrap();
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn key_is_file_name() {
        assert_eq!(ResumeCache::key_for(Path::new("/music/x/Song.mp3")), "Song.mp3");
        assert_eq!(ResumeCache::key_for(Path::new("Song.mp3")), "Song.mp3");
    }
}
