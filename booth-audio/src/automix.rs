//! Auto-mix coordinator - timed crossfade transitions between decks

use crate::deck::{DeckId, DeckStatus};
use std::time::Duration;
use tracing::debug;

/// Coordinator tuning
///
/// The trigger window and fade step are heuristics, not derived from any
/// beat analysis, so they stay configurable rather than hard constants.
#[derive(Debug, Clone, Copy)]
pub struct AutoMixConfig {
    /// Seconds before track end at which a transition starts
    pub trigger_window_secs: f64,
    /// Crossfader increment applied per tick while transitioning
    pub fade_step: f32,
    /// Poll period for `tick` while auto-mix is enabled
    pub tick_interval: Duration,
}

impl Default for AutoMixConfig {
    fn default() -> Self {
        Self {
            trigger_window_secs: 10.0,
            fade_step: 0.005,
            tick_interval: Duration::from_millis(200),
        }
    }
}

/// Transition state; at most one transition is ever in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionState {
    #[default]
    Idle,
    TransitioningToA,
    TransitioningToB,
}

/// The control surface the coordinator drives
///
/// Implemented over the real engine plus queue loading by the application,
/// and by fakes in tests. Crossfader writes from the coordinator and from
/// manual input go through the same setter; the last writer wins each tick,
/// which is the intended manual-override behavior.
pub trait MixSurface {
    fn deck_status(&self, deck: DeckId) -> DeckStatus;
    fn has_track(&self, deck: DeckId) -> bool;
    /// Best-effort playback start; failures must not propagate to the tick
    fn start_playback(&mut self, deck: DeckId);
    fn crossfader(&self) -> f32;
    fn set_crossfader(&mut self, value: f32);
    /// Load the queue entry at `index` into `deck`
    fn load_queued(&mut self, deck: DeckId, index: usize);
}

/// Polling state machine that watches deck positions, fades the crossfader
/// near track end, and advances the playback queue
pub struct AutoMix {
    config: AutoMixConfig,
    state: TransitionState,
    /// Queue cursor; wraps modulo the queue length indefinitely
    cursor: usize,
    /// Deck that lost focus in the last transition. Its replacement load is
    /// asynchronous, so until the new track lands (or the old one runs out)
    /// the deck still reads as near its end; triggering against it again
    /// would re-fire the completed transition every tick.
    holdoff: Option<DeckId>,
    enabled: bool,
}

impl AutoMix {
    pub fn new(config: AutoMixConfig) -> Self {
        Self {
            config,
            state: TransitionState::Idle,
            cursor: 0,
            holdoff: None,
            enabled: false,
        }
    }

    pub fn config(&self) -> &AutoMixConfig {
        &self.config
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable auto-mix
    ///
    /// Disabling abandons any in-flight transition mid-fade: the crossfader
    /// stays wherever it is and no rollback happens.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled && !enabled && self.state != TransitionState::Idle {
            debug!(state = ?self.state, "auto-mix disabled mid-transition; abandoning fade");
            self.state = TransitionState::Idle;
        }
        self.enabled = enabled;
    }

    pub fn queue_cursor(&self) -> usize {
        self.cursor
    }

    /// One poll step; bounded work, never blocks
    ///
    /// From `Idle`, starts a transition when the playing deck is inside the
    /// trigger window and the other deck can take over. While transitioning,
    /// steps the crossfader toward the endpoint and, on arrival, snaps to it
    /// exactly, queues the next track into the deck that lost focus, and
    /// returns to `Idle`. Triggers observed mid-transition are ignored, and
    /// the deck that lost focus cannot re-trigger until its status leaves
    /// the window.
    pub fn tick(&mut self, surface: &mut impl MixSurface, queue_len: usize) {
        if !self.enabled {
            return;
        }

        if self.state == TransitionState::Idle {
            // Release the hold-off once the deck's status shows something
            // other than the track that just faded out
            if let Some(deck) = self.holdoff {
                if !self.in_window(surface, deck) {
                    self.holdoff = None;
                }
            }
            if self.should_trigger(surface, DeckId::A) {
                self.try_start(surface, DeckId::B, queue_len);
            } else if self.should_trigger(surface, DeckId::B) {
                self.try_start(surface, DeckId::A, queue_len);
            }
        }

        let target = match self.state {
            TransitionState::Idle => return,
            TransitionState::TransitioningToA => 0.0f32,
            TransitionState::TransitioningToB => 1.0f32,
        };

        let step = self.config.fade_step;
        let position = surface.crossfader();
        if (position - target).abs() < step {
            surface.set_crossfader(target);
            // The deck that just lost focus gets the next queued track,
            // ready for the following cycle
            let losing = if target >= 1.0 { DeckId::A } else { DeckId::B };
            if queue_len > 0 {
                surface.load_queued(losing, self.cursor % queue_len);
                self.cursor = (self.cursor + 1) % queue_len;
            }
            self.holdoff = Some(losing);
            debug!(%losing, cursor = self.cursor, "transition complete");
            self.state = TransitionState::Idle;
        } else if target > position {
            surface.set_crossfader(position + step);
        } else {
            surface.set_crossfader(position - step);
        }
    }

    /// Should a transition away from `deck` start?
    fn should_trigger(&self, surface: &impl MixSurface, deck: DeckId) -> bool {
        self.holdoff != Some(deck) && self.in_window(surface, deck)
    }

    /// Is `deck` playing inside the end-of-track trigger window?
    fn in_window(&self, surface: &impl MixSurface, deck: DeckId) -> bool {
        let status = surface.deck_status(deck);
        status.is_playing
            && status.duration > 0.0
            && status.current_time > status.duration - self.config.trigger_window_secs
    }

    /// Start a transition toward `to` if it has anything to play
    fn try_start(&mut self, surface: &mut impl MixSurface, to: DeckId, queue_len: usize) {
        if queue_len == 0 && !surface.has_track(to) {
            return;
        }
        surface.start_playback(to);
        self.state = match to {
            DeckId::A => TransitionState::TransitioningToA,
            DeckId::B => TransitionState::TransitioningToB,
        };
        debug!(to = %to, "transition started");
    }
}

impl Default for AutoMix {
    fn default() -> Self {
        Self::new(AutoMixConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Fake control surface recording everything the coordinator does
    ///
    /// `load_queued` lands a fresh track immediately (status rewinds to the
    /// top) unless `stalled_loads` is set, which models a decode still in
    /// flight on a worker thread.
    struct FakeSurface {
        statuses: HashMap<DeckId, DeckStatus>,
        tracks: HashMap<DeckId, bool>,
        crossfader: f32,
        plays: Vec<DeckId>,
        loads: Vec<(DeckId, usize)>,
        fader_history: Vec<f32>,
        stalled_loads: bool,
    }

    impl FakeSurface {
        fn new() -> Self {
            Self {
                statuses: HashMap::new(),
                tracks: HashMap::new(),
                crossfader: 0.0,
                plays: Vec::new(),
                loads: Vec::new(),
                fader_history: Vec::new(),
                stalled_loads: false,
            }
        }

        fn playing_near_end(mut self, deck: DeckId, remaining: f64) -> Self {
            self.near_end(deck, remaining);
            self
        }

        fn with_track(mut self, deck: DeckId) -> Self {
            self.tracks.insert(deck, true);
            self
        }

        fn with_stalled_loads(mut self) -> Self {
            self.stalled_loads = true;
            self
        }

        fn near_end(&mut self, deck: DeckId, remaining: f64) {
            self.statuses.insert(
                deck,
                DeckStatus {
                    is_playing: true,
                    current_time: 180.0 - remaining,
                    duration: 180.0,
                },
            );
            self.tracks.insert(deck, true);
        }
    }

    impl MixSurface for FakeSurface {
        fn deck_status(&self, deck: DeckId) -> DeckStatus {
            self.statuses.get(&deck).copied().unwrap_or_default()
        }

        fn has_track(&self, deck: DeckId) -> bool {
            self.tracks.get(&deck).copied().unwrap_or(false)
        }

        fn start_playback(&mut self, deck: DeckId) {
            self.plays.push(deck);
        }

        fn crossfader(&self) -> f32 {
            self.crossfader
        }

        fn set_crossfader(&mut self, value: f32) {
            self.crossfader = value;
            self.fader_history.push(value);
        }

        fn load_queued(&mut self, deck: DeckId, index: usize) {
            self.loads.push((deck, index));
            if !self.stalled_loads {
                self.statuses.insert(
                    deck,
                    DeckStatus {
                        is_playing: true,
                        current_time: 0.0,
                        duration: 180.0,
                    },
                );
                self.tracks.insert(deck, true);
            }
        }
    }

    fn enabled_automix() -> AutoMix {
        let mut automix = AutoMix::default();
        automix.set_enabled(true);
        automix
    }

    #[test]
    fn trigger_inside_window_leaves_idle() {
        let mut surface = FakeSurface::new()
            .playing_near_end(DeckId::A, 5.0)
            .with_track(DeckId::B);
        let mut automix = enabled_automix();

        automix.tick(&mut surface, 3);
        assert_eq!(automix.state(), TransitionState::TransitioningToB);
        assert_eq!(surface.plays, vec![DeckId::B]);
    }

    #[test]
    fn no_trigger_outside_window() {
        let mut surface = FakeSurface::new()
            .playing_near_end(DeckId::A, 20.0)
            .with_track(DeckId::B);
        let mut automix = enabled_automix();

        automix.tick(&mut surface, 3);
        assert_eq!(automix.state(), TransitionState::Idle);
        assert!(surface.plays.is_empty());
    }

    #[test]
    fn no_transition_without_track_or_queue() {
        let mut surface = FakeSurface::new().playing_near_end(DeckId::A, 5.0);
        let mut automix = enabled_automix();

        automix.tick(&mut surface, 0);
        assert_eq!(automix.state(), TransitionState::Idle);
        assert!(surface.plays.is_empty());
    }

    #[test]
    fn empty_queue_still_transitions_to_loaded_deck() {
        let mut surface = FakeSurface::new()
            .playing_near_end(DeckId::A, 5.0)
            .with_track(DeckId::B);
        let mut automix = enabled_automix();

        automix.tick(&mut surface, 0);
        assert_eq!(automix.state(), TransitionState::TransitioningToB);
    }

    #[test]
    fn full_transition_is_monotonic_and_snaps_to_target() {
        let mut surface = FakeSurface::new()
            .playing_near_end(DeckId::A, 5.0)
            .with_track(DeckId::B);
        let mut automix = enabled_automix();

        // 0 -> 1 at 0.005/tick is 200 ticks; give headroom
        for _ in 0..300 {
            automix.tick(&mut surface, 2);
            if automix.state() == TransitionState::Idle && !surface.fader_history.is_empty() {
                break;
            }
        }

        assert_eq!(automix.state(), TransitionState::Idle);
        assert_eq!(surface.crossfader, 1.0, "must snap exactly to the target");
        for pair in surface.fader_history.windows(2) {
            assert!(pair[1] >= pair[0], "crossfader must never reverse");
        }
        assert!(
            surface.fader_history.iter().all(|&v| v <= 1.0 + 1e-6),
            "never overshoots"
        );

        // The deck that lost focus received queue entry 0, cursor advanced
        assert_eq!(surface.loads, vec![(DeckId::A, 0)]);
        assert_eq!(automix.queue_cursor(), 1);
    }

    #[test]
    fn completion_with_empty_queue_skips_load() {
        let mut surface = FakeSurface::new()
            .playing_near_end(DeckId::A, 5.0)
            .with_track(DeckId::B);
        let mut automix = enabled_automix();

        for _ in 0..300 {
            automix.tick(&mut surface, 0);
        }
        assert_eq!(automix.state(), TransitionState::Idle);
        assert!(surface.loads.is_empty());
        assert_eq!(automix.queue_cursor(), 0);
        // The old track still reads near its end, yet no second transition
        // fires against it
        assert_eq!(surface.plays, vec![DeckId::B]);
    }

    #[test]
    fn slow_queue_load_does_not_retrigger() {
        // The losing deck's replacement decode is still in flight, so its
        // status keeps reading near the end of the old track
        let mut surface = FakeSurface::new()
            .playing_near_end(DeckId::A, 5.0)
            .with_track(DeckId::B)
            .with_stalled_loads();
        let mut automix = enabled_automix();

        // Full fade plus many idle ticks at the endpoint
        for _ in 0..300 {
            automix.tick(&mut surface, 2);
        }

        assert_eq!(
            surface.loads,
            vec![(DeckId::A, 0)],
            "one transition, one queue load"
        );
        assert_eq!(surface.plays, vec![DeckId::B]);
        assert_eq!(automix.queue_cursor(), 1);
    }

    #[test]
    fn trigger_ignored_while_transitioning() {
        let mut surface = FakeSurface::new()
            .playing_near_end(DeckId::A, 5.0)
            .playing_near_end(DeckId::B, 5.0);
        let mut automix = enabled_automix();

        automix.tick(&mut surface, 2);
        let first_state = automix.state();
        automix.tick(&mut surface, 2);

        assert_eq!(automix.state(), first_state);
        assert_eq!(surface.plays.len(), 1, "only one transition in flight");
    }

    #[test]
    fn queue_cursor_wraps_modulo_length() {
        // Three complete transitions against a 2-entry queue; after each
        // completion the newly focused deck runs down to its own end
        let mut surface = FakeSurface::new()
            .playing_near_end(DeckId::A, 5.0)
            .with_track(DeckId::B);
        let mut automix = enabled_automix();

        for round in 0..3 {
            for _ in 0..300 {
                automix.tick(&mut surface, 2);
            }
            assert_eq!(automix.state(), TransitionState::Idle);
            let focused = if round % 2 == 0 { DeckId::B } else { DeckId::A };
            surface.near_end(focused, 5.0);
        }

        assert_eq!(
            surface.loads,
            vec![(DeckId::A, 0), (DeckId::B, 1), (DeckId::A, 0)],
            "one queue load per transition"
        );
        assert_eq!(automix.queue_cursor(), 1, "cursor wraps: 0, 1, 0 used; next is 1");
    }

    #[test]
    fn disabling_abandons_transition_mid_fade() {
        let mut surface = FakeSurface::new()
            .playing_near_end(DeckId::A, 5.0)
            .with_track(DeckId::B);
        let mut automix = enabled_automix();

        for _ in 0..10 {
            automix.tick(&mut surface, 1);
        }
        let mid_fade = surface.crossfader;
        assert!(mid_fade > 0.0 && mid_fade < 1.0);

        automix.set_enabled(false);
        assert_eq!(automix.state(), TransitionState::Idle);

        automix.tick(&mut surface, 1);
        assert_eq!(surface.crossfader, mid_fade, "abandoned, not rolled back");
    }

    #[test]
    fn manual_override_races_last_write_wins() {
        let mut surface = FakeSurface::new()
            .playing_near_end(DeckId::A, 5.0)
            .with_track(DeckId::B);
        let mut automix = enabled_automix();

        for _ in 0..10 {
            automix.tick(&mut surface, 1);
        }

        // The operator yanks the fader back toward A between ticks
        surface.crossfader = 0.9;
        automix.tick(&mut surface, 1);

        // The coordinator continues from the manual value
        assert!((surface.crossfader - 0.905).abs() < 1e-6);
    }

    #[test]
    fn disabled_coordinator_does_nothing() {
        let mut surface = FakeSurface::new()
            .playing_near_end(DeckId::A, 5.0)
            .with_track(DeckId::B);
        let mut automix = AutoMix::default();

        automix.tick(&mut surface, 2);
        assert_eq!(automix.state(), TransitionState::Idle);
        assert!(surface.plays.is_empty());
        assert!(surface.fader_history.is_empty());
    }
}
