//! Named track collections

use crate::playlist::Track;
use thiserror::Error;
use tracing::warn;

/// The built-in collection every library starts with
pub const DEFAULT_FOLDER: &str = "Collection";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FolderError {
    #[error("folder already exists: {0}")]
    AlreadyExists(String),
    #[error("no such folder: {0}")]
    NotFound(String),
    #[error("the default collection cannot be deleted")]
    DefaultUndeletable,
}

struct Folder {
    name: String,
    tracks: Vec<Track>,
}

/// In-memory folder set; the default collection always exists
///
/// Insertion order is display order, with the default collection first.
pub struct Folders {
    folders: Vec<Folder>,
}

impl Folders {
    pub fn new() -> Self {
        Self {
            folders: vec![Folder {
                name: DEFAULT_FOLDER.to_string(),
                tracks: Vec::new(),
            }],
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.folders.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn create(&mut self, name: &str) -> Result<(), FolderError> {
        if self.folders.iter().any(|f| f.name == name) {
            return Err(FolderError::AlreadyExists(name.to_string()));
        }
        self.folders.push(Folder {
            name: name.to_string(),
            tracks: Vec::new(),
        });
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<(), FolderError> {
        if name == DEFAULT_FOLDER {
            warn!("refusing to delete the default collection");
            return Err(FolderError::DefaultUndeletable);
        }
        let index = self
            .folders
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| FolderError::NotFound(name.to_string()))?;
        self.folders.remove(index);
        Ok(())
    }

    pub fn add_track(&mut self, folder: &str, track: Track) -> Result<(), FolderError> {
        let folder = self
            .folders
            .iter_mut()
            .find(|f| f.name == folder)
            .ok_or_else(|| FolderError::NotFound(folder.to_string()))?;
        folder.tracks.push(track);
        Ok(())
    }

    pub fn tracks(&self, folder: &str) -> Option<&[Track]> {
        self.folders
            .iter()
            .find(|f| f.name == folder)
            .map(|f| f.tracks.as_slice())
    }
}

impl Default for Folders {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_collection_exists_and_cannot_be_deleted() {
        let mut folders = Folders::new();
        assert_eq!(folders.names(), vec![DEFAULT_FOLDER]);
        assert_eq!(
            folders.delete(DEFAULT_FOLDER),
            Err(FolderError::DefaultUndeletable)
        );
        assert_eq!(folders.names(), vec![DEFAULT_FOLDER]);
    }

    #[test]
    fn create_and_delete_roundtrip() {
        let mut folders = Folders::new();
        folders.create("House").expect("fresh name");
        assert_eq!(folders.names(), vec![DEFAULT_FOLDER, "House"]);
        folders.delete("House").expect("exists");
        assert_eq!(folders.names(), vec![DEFAULT_FOLDER]);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut folders = Folders::new();
        folders.create("House").expect("fresh name");
        assert_eq!(
            folders.create("House"),
            Err(FolderError::AlreadyExists("House".into()))
        );
    }

    #[test]
    fn tracks_land_in_the_right_folder() {
        let mut folders = Folders::new();
        folders.create("Techno").expect("fresh name");
        let track = Track::new(PathBuf::from("/music/a.mp3"));
        folders.add_track("Techno", track.clone()).expect("exists");

        assert_eq!(folders.tracks("Techno"), Some(&[track][..]));
        assert_eq!(folders.tracks(DEFAULT_FOLDER), Some(&[][..]));
        assert_eq!(folders.tracks("Missing"), None);
    }
}
