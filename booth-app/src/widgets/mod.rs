//! UI widgets for Booth

mod crossfader;
mod deck;
mod pads;
mod playlist;
mod rhythm;
mod spectrum;
mod status_bar;

pub use crossfader::CrossfaderWidget;
pub use deck::DeckWidget;
pub use pads::PadsWidget;
pub use playlist::PlaylistWidget;
pub use rhythm::RhythmWidget;
pub use spectrum::SpectrumWidget;
pub use status_bar::StatusBarWidget;
