//! Directory scanning for audio files

use crate::playlist::Track;
use std::path::Path;
use tracing::debug;

/// Extensions the loader can decode
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac"];

/// Recursively collect audio files under `dir` as tracks
///
/// Unreadable directories are skipped silently; results are sorted by path
/// for stable ordering across runs.
pub fn scan_directory(dir: &Path) -> Vec<Track> {
    let mut paths = Vec::new();
    collect(dir, &mut paths);
    paths.sort();
    debug!(dir = %dir.display(), count = paths.len(), "library scan complete");
    paths.into_iter().map(Track::new).collect()
}

fn collect(dir: &Path, out: &mut Vec<std::path::PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() {
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                if AUDIO_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
                    out.push(path);
                }
            }
        } else if path.is_dir() {
            collect(&path, out);
        }
    }
}
