//! Console - ties the engine, loader, and queue together
//!
//! All deck and one-shot decoding happens on worker threads; completions are
//! applied from the main loop via `poll`, so neither the render loop nor the
//! audio callback ever waits on file IO.

use booth_audio::{AutoMix, DeckId, DeckStatus, MixSurface, Player, SharedEngine, TrackSource};
use booth_library::{LoadError, LoadedTrack, Playlist, Track, TrackLoader};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use tracing::{info, warn};

/// One sampler pad: a file reference plus its decoded buffer once known
pub struct Pad {
    pub name: String,
    track: Track,
    buffer: Option<Arc<Vec<f32>>>,
}

struct PendingDeckLoad {
    deck: DeckId,
    name: String,
    /// Manual loads snap the crossfader to the loaded deck's end
    snap: bool,
    rx: Receiver<Result<LoadedTrack, LoadError>>,
}

struct PendingPadLoad {
    index: usize,
    rx: Receiver<Result<LoadedTrack, LoadError>>,
}

/// Control-side owner of the engine handle, playback queue, and pad bank
pub struct Console {
    engine: SharedEngine,
    loader: TrackLoader,
    pub playlist: Playlist,
    pads: Vec<Pad>,
    pending_decks: Vec<PendingDeckLoad>,
    pending_pads: Vec<PendingPadLoad>,
}

impl Console {
    /// Build the console and both deck chains
    pub fn new(engine: SharedEngine, loader: TrackLoader) -> Self {
        {
            let mut engine = engine.lock();
            engine.bind_deck(DeckId::A, Player::new());
            engine.bind_deck(DeckId::B, Player::new());
        }
        Self {
            engine,
            loader,
            playlist: Playlist::new(),
            pads: Vec::new(),
            pending_decks: Vec::new(),
            pending_pads: Vec::new(),
        }
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    pub fn pads(&self) -> &[Pad] {
        &self.pads
    }

    pub fn set_pads(&mut self, tracks: Vec<Track>) {
        self.pads = tracks
            .into_iter()
            .take(9)
            .map(|track| Pad {
                name: track.name.clone(),
                track,
                buffer: None,
            })
            .collect();
    }

    /// Start an asynchronous load of a queue entry into a deck
    ///
    /// Returns the track name for status display, or `None` if the index is
    /// out of range.
    pub fn request_load(&mut self, deck: DeckId, index: usize, snap: bool) -> Option<String> {
        let track = self.playlist.get(index)?.clone();
        info!(%deck, track = %track.name, "deck load requested");
        let rx = self.loader.load_async(track.path.clone());
        self.pending_decks.push(PendingDeckLoad {
            deck,
            name: track.name.clone(),
            snap,
            rx,
        });
        Some(track.name)
    }

    /// Fire a sampler pad, decoding it first if this is its first use
    pub fn trigger_pad(&mut self, index: usize) -> Option<String> {
        let pad = self.pads.get(index)?;
        match &pad.buffer {
            Some(buffer) => {
                let buffer = Arc::clone(buffer);
                self.engine.lock().play_one_shot(buffer);
                None
            }
            None => {
                // Already decoding; don't queue a second worker
                if self.pending_pads.iter().any(|p| p.index == index) {
                    return None;
                }
                let rx = self.loader.load_async(pad.track.path.clone());
                let name = pad.name.clone();
                self.pending_pads.push(PendingPadLoad { index, rx });
                Some(format!("Decoding {name}..."))
            }
        }
    }

    /// Toggle play/pause on a deck; returns a message for failures
    pub fn toggle_play(&mut self, deck: DeckId) -> Option<String> {
        let mut engine = self.engine.lock();
        engine.activate();
        if engine.deck_status(deck).is_playing {
            engine.pause(deck);
            None
        } else {
            match engine.play(deck) {
                Ok(()) => None,
                Err(e) => Some(e.to_string()),
            }
        }
    }

    /// Apply finished worker-thread loads; returns status messages
    pub fn poll(&mut self) -> Vec<String> {
        let mut messages = Vec::new();

        let mut i = 0;
        while i < self.pending_decks.len() {
            match self.pending_decks[i].rx.try_recv() {
                Ok(result) => {
                    let pending = self.pending_decks.swap_remove(i);
                    match result {
                        Ok(track) => {
                            let source = TrackSource {
                                locator: pending.name.clone(),
                                name: track.metadata.title.clone(),
                                samples: Arc::new(track.samples),
                                sample_rate: track.sample_rate,
                            };
                            let mut engine = self.engine.lock();
                            engine.load_track(pending.deck, source);
                            if pending.snap {
                                let position = match pending.deck {
                                    DeckId::A => 0.0,
                                    DeckId::B => 1.0,
                                };
                                engine.set_crossfader(position);
                            }
                            messages
                                .push(format!("Loaded to deck {}: {}", pending.deck, pending.name));
                        }
                        Err(e) => {
                            warn!(%e, track = %pending.name, "deck load failed");
                            messages.push(format!("Failed to load {}: {e}", pending.name));
                        }
                    }
                }
                Err(_) => i += 1,
            }
        }

        let mut i = 0;
        while i < self.pending_pads.len() {
            match self.pending_pads[i].rx.try_recv() {
                Ok(result) => {
                    let pending = self.pending_pads.swap_remove(i);
                    match result {
                        Ok(track) => {
                            let buffer = Arc::new(track.samples);
                            if let Some(pad) = self.pads.get_mut(pending.index) {
                                pad.buffer = Some(Arc::clone(&buffer));
                            }
                            self.engine.lock().play_one_shot(buffer);
                        }
                        Err(e) => {
                            // One-shot decode failures never disturb anything else
                            warn!(%e, pad = pending.index, "one-shot decode failed");
                            messages.push(format!("Pad {} failed: {e}", pending.index + 1));
                        }
                    }
                }
                Err(_) => i += 1,
            }
        }

        messages
    }

    /// Run one coordinator step against the live queue
    pub fn tick_automix(&mut self, automix: &mut AutoMix) {
        let queue_len = self.playlist.len();
        automix.tick(self, queue_len);
    }
}

impl MixSurface for Console {
    fn deck_status(&self, deck: DeckId) -> DeckStatus {
        self.engine.lock().deck_status(deck)
    }

    fn has_track(&self, deck: DeckId) -> bool {
        self.engine.lock().has_track(deck)
    }

    fn start_playback(&mut self, deck: DeckId) {
        if let Err(e) = self.engine.lock().play(deck) {
            warn!(%deck, %e, "auto-mix playback start failed");
        }
    }

    fn crossfader(&self) -> f32 {
        self.engine.lock().crossfader()
    }

    fn set_crossfader(&mut self, value: f32) {
        self.engine.lock().set_crossfader(value);
    }

    fn load_queued(&mut self, deck: DeckId, index: usize) {
        self.request_load(deck, index, false);
    }
}
