//! Track library for Booth - decoding, playlists, folders, scanning

mod folders;
mod loader;
mod playlist;
mod scanner;

pub use folders::{FolderError, Folders, DEFAULT_FOLDER};
pub use loader::{LoadError, LoadedTrack, TrackLoader, TrackMetadata};
pub use playlist::{Playlist, Track};
pub use scanner::{scan_directory, AUDIO_EXTENSIONS};
