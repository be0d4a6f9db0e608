use std::path::{Path, PathBuf};

use super::probe::MetadataProvider;

/// Where the cover for `track` is cached: `<dir>/<file name, dots as underscores>_cover.jpg`.
pub fn cover_path(cache_dir: &Path, track: &Path) -> PathBuf {
    let name = track
        .file_name()
        .map(|n| n.to_string_lossy().replace('.', "_"))
        .unwrap_or_else(|| "track".to_string());
    cache_dir.join(format!("{}_cover.jpg", name))
}

/// Return a cached cover image, extracting it first if needed. `None` when the
/// track has no cover or it cannot be stored.
pub fn cached_cover(
    provider: &dyn MetadataProvider,
    cache_dir: &Path,
    track: &Path,
) -> Option<PathBuf> {
    let path = cover_path(cache_dir, track);
    if path.is_file() {
        return Some(path);
    }

    let bytes = provider.cover_image(track)?;
    if let Err(err) = std::fs::create_dir_all(cache_dir).and_then(|_| std::fs::write(&path, &bytes)) {
        log::warn!("Failed to cache cover art at {}: {}", path.display(), err);
        return None;
    }
    log::info!("Cover art saved to {}", path.display());
    Some(path)
}
