//! Playback queue

use std::path::PathBuf;

/// One queued track reference; decoding happens at load time, not here
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub path: PathBuf,
    pub name: String,
}

impl Track {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string();
        Self { path, name }
    }
}

/// Ordered queue of tracks
///
/// The auto-mix coordinator only ever reads entries by index; all mutation
/// goes through the owner.
#[derive(Debug, Default)]
pub struct Playlist {
    tracks: Vec<Track>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn remove(&mut self, index: usize) -> Option<Track> {
        if index < self.tracks.len() {
            Some(self.tracks.remove(index))
        } else {
            None
        }
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(name: &str) -> Track {
        Track::new(PathBuf::from(format!("/music/{name}.mp3")))
    }

    #[test]
    fn track_name_comes_from_file_stem() {
        let t = Track::new(PathBuf::from("/music/night drive.flac"));
        assert_eq!(t.name, "night drive");
    }

    #[test]
    fn queue_preserves_insertion_order() {
        let mut playlist = Playlist::new();
        playlist.push(track("a"));
        playlist.push(track("b"));
        playlist.push(track("c"));

        let names: Vec<&str> = playlist.tracks().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn remove_out_of_range_is_none() {
        let mut playlist = Playlist::new();
        playlist.push(track("a"));
        assert!(playlist.remove(5).is_none());
        assert_eq!(playlist.len(), 1);
    }
}
