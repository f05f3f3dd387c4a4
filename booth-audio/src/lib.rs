//! Audio engine for Booth - decks, crossfade, sampler, and auto-mix
//!
//! This crate is the core of the mixing console:
//! - Engine: context lifecycle, per-deck chains, master bus, transport
//! - DeckChain: source player, 3-band EQ, smoothed channel gain, spectrum tap
//! - Fader: equal-power crossfade gain law
//! - Sampler: fire-and-forget one-shot voices on the master bus
//! - AutoMix: the timed transition state machine driving the crossfader

mod automix;
mod deck;
mod engine;
mod eq;
mod fader;
mod sampler;

pub use automix::{AutoMix, AutoMixConfig, MixSurface, TransitionState};
pub use deck::{DeckChain, DeckId, DeckStatus, Player, TrackSource};
pub use engine::{ContextState, Engine, EngineError};
pub use eq::{Band, ThreeBandEq, EQ_RANGE_DB};
pub use fader::{crossfade_gains, SmoothedGain, GAIN_SMOOTHING_SECS};
pub use sampler::Sampler;

use parking_lot::Mutex;
use std::sync::Arc;

/// Engine handle shared between the control surface and the audio callback
pub type SharedEngine = Arc<Mutex<Engine>>;

/// Wrap an engine for sharing with the output stream callback
pub fn shared(engine: Engine) -> SharedEngine {
    Arc::new(Mutex::new(engine))
}
