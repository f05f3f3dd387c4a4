//! Mixing engine - context lifecycle, deck routing, master bus

use crate::deck::{DeckChain, DeckId, DeckStatus, Player, TrackSource};
use crate::eq::Band;
use crate::fader::{crossfade_gains, SmoothedGain, GAIN_SMOOTHING_SECS};
use crate::sampler::Sampler;
use booth_analysis::FrequencyData;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Pre-allocated scratch size (2048 stereo frames)
const MAX_BUFFER_SIZE: usize = 4096;

/// Output-context lifecycle
///
/// The context starts uninitialized and must be activated from a
/// user-initiated control path; until then the engine renders silence
/// rather than erroring. Suspension halts graph time entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Uninitialized,
    Active,
    Suspended,
}

/// Errors surfaced by engine transport operations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Playback was requested before the context was ever activated.
    /// Distinct from other failures so the UI can show an actionable
    /// "press start" style message.
    #[error("playback blocked: engine has not been activated")]
    PlaybackBlocked,
    /// The deck is bound but has no media loaded
    #[error("deck {0} has no media loaded")]
    NoMediaLoaded(DeckId),
}

/// The mixing engine: one output context, two deck chains, a master bus
///
/// Explicitly constructed and explicitly activated; all graph mutation goes
/// through these methods - no external component reaches into a chain
/// directly. Status and analysis queries are pull-based snapshots and never
/// fail: unknown/unbound decks degrade to inert defaults.
pub struct Engine {
    context: ContextState,
    sample_rate: u32,
    crossfader: f32,
    master_gain: SmoothedGain,
    sampler: Sampler,
    deck_a: Option<DeckChain>,
    deck_b: Option<DeckChain>,
    /// Pre-allocated per-deck render buffer (no allocation in the callback)
    scratch: Vec<f32>,
}

impl Engine {
    /// Create an engine rendering at `sample_rate`; the context stays
    /// uninitialized until `activate` is called
    pub fn new(sample_rate: u32) -> Self {
        Self {
            context: ContextState::Uninitialized,
            sample_rate,
            crossfader: 0.5,
            master_gain: SmoothedGain::new(sample_rate, GAIN_SMOOTHING_SECS, 1.0),
            sampler: Sampler::new(),
            deck_a: None,
            deck_b: None,
            scratch: vec![0.0; MAX_BUFFER_SIZE],
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn context_state(&self) -> ContextState {
        self.context
    }

    /// Activate the output context (idempotent)
    ///
    /// First call brings the context up; later calls resume a suspended
    /// context and are otherwise no-ops. Must be driven from a
    /// user-initiated control path.
    pub fn activate(&mut self) {
        match self.context {
            ContextState::Uninitialized => {
                self.context = ContextState::Active;
                debug!(sample_rate = self.sample_rate, "engine activated");
            }
            ContextState::Suspended => self.resume_if_suspended(),
            ContextState::Active => {}
        }
    }

    /// Suspend rendering; deck positions freeze until resumed
    pub fn suspend(&mut self) {
        if self.context == ContextState::Active {
            self.context = ContextState::Suspended;
            debug!("engine suspended");
        }
    }

    /// Resume a suspended context; no-op in any other state
    pub fn resume_if_suspended(&mut self) {
        if self.context == ContextState::Suspended {
            self.context = ContextState::Active;
            debug!("engine resumed");
        }
    }

    /// Construct and register a deck's processing chain
    ///
    /// Binding a deck id that already has a chain logs a warning and keeps
    /// the existing chain intact - never an error, never a second graph.
    pub fn bind_deck(&mut self, deck: DeckId, player: Player) {
        if self.chain(deck).is_some() {
            warn!(%deck, "deck already bound; keeping the existing chain");
            return;
        }

        let (gain_a, gain_b) = crossfade_gains(self.crossfader);
        let initial = match deck {
            DeckId::A => gain_a,
            DeckId::B => gain_b,
        };
        *self.slot_mut(deck) = Some(DeckChain::new(self.sample_rate, player, initial));
        debug!(%deck, "deck chain constructed");
    }

    /// Explicitly tear down and rebuild a deck's chain
    pub fn rebind_deck(&mut self, deck: DeckId, player: Player) {
        if self.slot_mut(deck).take().is_some() {
            debug!(%deck, "existing chain torn down for rebind");
        }
        self.bind_deck(deck, player);
    }

    /// Replace the media loaded in a deck's player
    pub fn load_track(&mut self, deck: DeckId, source: TrackSource) {
        match self.chain_mut(deck) {
            Some(chain) => {
                debug!(%deck, locator = %source.locator, "loading track");
                chain.load(source);
            }
            None => warn!(%deck, "load ignored: deck not bound"),
        }
    }

    /// Set the crossfader position, clamped to [0, 1]
    ///
    /// Both decks' gain targets are recomputed with the equal-power law;
    /// the chains smooth toward them so the change is click-free.
    pub fn set_crossfader(&mut self, value: f32) {
        self.crossfader = value.clamp(0.0, 1.0);
        let (gain_a, gain_b) = crossfade_gains(self.crossfader);
        if let Some(chain) = &mut self.deck_a {
            chain.set_gain_target(gain_a);
        }
        if let Some(chain) = &mut self.deck_b {
            chain.set_gain_target(gain_b);
        }
    }

    pub fn crossfader(&self) -> f32 {
        self.crossfader
    }

    /// Current crossfade gain target of a deck (0.0 when unbound)
    pub fn channel_gain_target(&self, deck: DeckId) -> f32 {
        self.chain(deck).map(|c| c.gain_target()).unwrap_or(0.0)
    }

    /// Set an EQ band from a control value in [-1, 1] (maps to +/-20 dB)
    pub fn set_eq(&mut self, deck: DeckId, band: Band, value: f32) {
        match self.chain_mut(deck) {
            Some(chain) => chain.set_eq(band, value),
            None => warn!(%deck, "EQ change ignored: deck not bound"),
        }
    }

    /// Read back an EQ stage's gain in dB (0.0 when unbound)
    pub fn eq_gain_db(&self, deck: DeckId, band: Band) -> f32 {
        self.chain(deck).map(|c| c.eq_gain_db(band)).unwrap_or(0.0)
    }

    /// Set the playback-rate multiplier ("pitch") on a deck's player
    ///
    /// Naive rate change: perceived pitch and duration shift together.
    pub fn set_pitch(&mut self, deck: DeckId, rate: f32) {
        match self.chain_mut(deck) {
            Some(chain) => chain.player_mut().set_rate(rate),
            None => warn!(%deck, "pitch change ignored: deck not bound"),
        }
    }

    pub fn pitch(&self, deck: DeckId) -> f32 {
        self.chain(deck).map(|c| c.player().rate()).unwrap_or(1.0)
    }

    /// Start playback on a deck
    ///
    /// Resumes a suspended context first. Fails with `PlaybackBlocked` if
    /// the context was never activated, leaving the deck not-playing.
    pub fn play(&mut self, deck: DeckId) -> Result<(), EngineError> {
        if self.context == ContextState::Uninitialized {
            warn!(%deck, "playback blocked: engine not activated");
            return Err(EngineError::PlaybackBlocked);
        }
        self.resume_if_suspended();

        match self.chain_mut(deck) {
            Some(chain) => {
                if chain.player_mut().play() {
                    Ok(())
                } else {
                    Err(EngineError::NoMediaLoaded(deck))
                }
            }
            None => {
                warn!(%deck, "play ignored: deck not bound");
                Ok(())
            }
        }
    }

    /// Pause a deck; inert on an unbound deck
    pub fn pause(&mut self, deck: DeckId) {
        if let Some(chain) = self.chain_mut(deck) {
            chain.player_mut().pause();
        }
    }

    /// Transport snapshot; `{false, 0, 0}` for an unbound deck, never fails
    pub fn deck_status(&self, deck: DeckId) -> DeckStatus {
        self.chain(deck)
            .map(|c| c.player().status())
            .unwrap_or_default()
    }

    /// Spectrum snapshot for a deck; zeroed bins when unbound
    pub fn frequency_data(&self, deck: DeckId) -> FrequencyData {
        self.chain(deck)
            .map(|c| c.frequency_data())
            .unwrap_or_default()
    }

    pub fn has_track(&self, deck: DeckId) -> bool {
        self.chain(deck).map(|c| c.player().has_media()).unwrap_or(false)
    }

    pub fn track_name(&self, deck: DeckId) -> Option<String> {
        self.chain(deck).and_then(|c| {
            let name = c.player().name();
            if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            }
        })
    }

    /// Fire a one-shot sound through the sampler bus
    ///
    /// Silently dropped (with a warning) before activation, mirroring the
    /// silent-not-erroring behavior of the rest of the pre-activation
    /// surface. Overlapping one-shots are all played.
    pub fn play_one_shot(&mut self, samples: Arc<Vec<f32>>) {
        if self.context == ContextState::Uninitialized {
            warn!("one-shot dropped: engine not activated");
            return;
        }
        self.resume_if_suspended();
        self.sampler.trigger(samples);
    }

    /// Number of one-shot voices currently sounding
    pub fn one_shot_voices(&self) -> usize {
        self.sampler.active_voices()
    }

    /// Render one interleaved stereo buffer
    ///
    /// Each bound deck renders through its chain and sums into the master
    /// bus along with the sampler voices; an inactive or suspended context
    /// renders silence and advances nothing.
    pub fn process(&mut self, output: &mut [f32]) {
        output.fill(0.0);
        if self.context != ContextState::Active {
            return;
        }

        let len = output.len();
        if self.scratch.len() < len {
            self.scratch.resize(len, 0.0);
        }

        let Self {
            deck_a,
            deck_b,
            scratch,
            sampler,
            master_gain,
            ..
        } = self;

        for chain in [deck_a, deck_b].into_iter().flatten() {
            let buf = &mut scratch[..len];
            chain.render(buf);
            for (out, sample) in output.iter_mut().zip(buf.iter()) {
                *out += *sample;
            }
        }

        sampler.mix_into(output);

        for frame in output.chunks_mut(2) {
            let g = master_gain.next();
            for sample in frame {
                *sample *= g;
            }
        }
    }

    fn chain(&self, deck: DeckId) -> Option<&DeckChain> {
        match deck {
            DeckId::A => self.deck_a.as_ref(),
            DeckId::B => self.deck_b.as_ref(),
        }
    }

    fn chain_mut(&mut self, deck: DeckId) -> Option<&mut DeckChain> {
        match deck {
            DeckId::A => self.deck_a.as_mut(),
            DeckId::B => self.deck_b.as_mut(),
        }
    }

    fn slot_mut(&mut self, deck: DeckId) -> &mut Option<DeckChain> {
        match deck {
            DeckId::A => &mut self.deck_a,
            DeckId::B => &mut self.deck_b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fader::crossfade_gains;

    fn source(frames: usize) -> TrackSource {
        TrackSource {
            locator: "file:///tmp/track.flac".into(),
            name: "track".into(),
            samples: Arc::new(vec![0.25; frames * 2]),
            sample_rate: 48000,
        }
    }

    fn engine_with_deck(deck: DeckId, frames: usize) -> Engine {
        let mut engine = Engine::new(48000);
        engine.activate();
        engine.bind_deck(deck, Player::new());
        engine.load_track(deck, source(frames));
        engine
    }

    #[test]
    fn unbound_deck_status_is_inert() {
        let engine = Engine::new(48000);
        assert_eq!(engine.deck_status(DeckId::A), DeckStatus::default());
        assert!(engine.frequency_data(DeckId::B).bins.iter().all(|&b| b == 0));
        assert_eq!(engine.eq_gain_db(DeckId::A, Band::Low), 0.0);
    }

    #[test]
    fn play_before_activation_is_blocked() {
        let mut engine = Engine::new(48000);
        engine.bind_deck(DeckId::A, Player::new());
        engine.load_track(DeckId::A, source(1000));

        assert_eq!(engine.play(DeckId::A), Err(EngineError::PlaybackBlocked));
        assert!(!engine.deck_status(DeckId::A).is_playing);
    }

    #[test]
    fn activate_is_idempotent() {
        let mut engine = Engine::new(48000);
        engine.activate();
        engine.activate();
        assert_eq!(engine.context_state(), ContextState::Active);

        engine.suspend();
        engine.activate();
        assert_eq!(engine.context_state(), ContextState::Active);
    }

    #[test]
    fn double_bind_keeps_first_chain() {
        let mut engine = engine_with_deck(DeckId::A, 48_000);
        let duration = engine.deck_status(DeckId::A).duration;
        assert!(duration > 0.0);

        // Second bind must not replace the loaded chain
        engine.bind_deck(DeckId::A, Player::new());
        assert_eq!(engine.deck_status(DeckId::A).duration, duration);
    }

    #[test]
    fn rebind_replaces_the_chain() {
        let mut engine = engine_with_deck(DeckId::A, 48_000);
        engine.rebind_deck(DeckId::A, Player::new());
        assert_eq!(engine.deck_status(DeckId::A).duration, 0.0);
    }

    #[test]
    fn crossfader_updates_both_gain_targets() {
        let mut engine = Engine::new(48000);
        engine.bind_deck(DeckId::A, Player::new());
        engine.bind_deck(DeckId::B, Player::new());

        engine.set_crossfader(0.25);
        let (gain_a, gain_b) = crossfade_gains(0.25);
        assert_eq!(engine.channel_gain_target(DeckId::A), gain_a);
        assert_eq!(engine.channel_gain_target(DeckId::B), gain_b);

        // Clamping
        engine.set_crossfader(7.0);
        assert_eq!(engine.crossfader(), 1.0);
    }

    #[test]
    fn eq_read_back_matches_linear_mapping() {
        let mut engine = engine_with_deck(DeckId::B, 1000);
        engine.set_eq(DeckId::B, Band::Mid, -0.5);
        assert_eq!(engine.eq_gain_db(DeckId::B, Band::Mid), -10.0);

        // Unknown deck id: no-op, default read-back
        engine.set_eq(DeckId::A, Band::Mid, 1.0);
        assert_eq!(engine.eq_gain_db(DeckId::A, Band::Mid), 0.0);
    }

    #[test]
    fn playback_advances_and_ends() {
        let mut engine = engine_with_deck(DeckId::A, 480);
        engine.play(DeckId::A).unwrap();

        let mut out = vec![0.0; 2048];
        engine.process(&mut out);

        let status = engine.deck_status(DeckId::A);
        assert!(!status.is_playing, "short track should have ended");
        assert!((status.current_time - status.duration).abs() < 1e-9);
    }

    #[test]
    fn suspension_freezes_playback() {
        let mut engine = engine_with_deck(DeckId::A, 48_000);
        engine.play(DeckId::A).unwrap();

        let mut out = vec![0.0; 512];
        engine.process(&mut out);
        let elapsed = engine.deck_status(DeckId::A).current_time;

        engine.suspend();
        engine.process(&mut out);
        assert_eq!(engine.deck_status(DeckId::A).current_time, elapsed);
        assert!(out.iter().all(|&s| s == 0.0));

        // Play resumes the suspended context
        engine.play(DeckId::A).unwrap();
        assert_eq!(engine.context_state(), ContextState::Active);
        engine.process(&mut out);
        assert!(engine.deck_status(DeckId::A).current_time > elapsed);
    }

    #[test]
    fn play_without_media_fails_and_rolls_back() {
        let mut engine = Engine::new(48000);
        engine.activate();
        engine.bind_deck(DeckId::A, Player::new());

        assert_eq!(
            engine.play(DeckId::A),
            Err(EngineError::NoMediaLoaded(DeckId::A))
        );
        assert!(!engine.deck_status(DeckId::A).is_playing);
    }

    #[test]
    fn play_on_unbound_deck_is_inert() {
        let mut engine = Engine::new(48000);
        engine.activate();
        assert_eq!(engine.play(DeckId::B), Ok(()));
    }

    #[test]
    fn one_shots_require_activation_and_self_clean() {
        let mut engine = Engine::new(48000);
        engine.play_one_shot(Arc::new(vec![0.5; 64]));
        assert_eq!(engine.one_shot_voices(), 0, "dropped before activation");

        engine.activate();
        engine.play_one_shot(Arc::new(vec![0.5; 64]));
        engine.play_one_shot(Arc::new(vec![0.5; 128]));
        engine.play_one_shot(Arc::new(vec![0.5; 256]));
        assert_eq!(engine.one_shot_voices(), 3);

        let mut out = vec![0.0; 512];
        engine.process(&mut out);
        assert_eq!(engine.one_shot_voices(), 0);
        assert!(out.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn pitch_rate_speeds_up_playback() {
        let mut normal = engine_with_deck(DeckId::A, 48_000);
        normal.play(DeckId::A).unwrap();

        let mut fast = engine_with_deck(DeckId::A, 48_000);
        fast.set_pitch(DeckId::A, 2.0);
        fast.play(DeckId::A).unwrap();

        let mut out = vec![0.0; 1024];
        normal.process(&mut out);
        let normal_time = normal.deck_status(DeckId::A).current_time;
        fast.process(&mut out);
        let fast_time = fast.deck_status(DeckId::A).current_time;

        assert!((fast_time / normal_time - 2.0).abs() < 1e-6);
    }
}
