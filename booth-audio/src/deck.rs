//! Deck chain - source player, EQ cascade, channel gain, spectrum tap

use crate::eq::{Band, ThreeBandEq};
use crate::fader::{SmoothedGain, GAIN_SMOOTHING_SECS};
use booth_analysis::{FrequencyData, SpectrumAnalyzer};
use std::fmt;
use std::sync::Arc;

/// Deck identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeckId {
    A,
    B,
}

impl DeckId {
    /// The opposite deck
    pub fn other(self) -> Self {
        match self {
            DeckId::A => DeckId::B,
            DeckId::B => DeckId::A,
        }
    }
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckId::A => write!(f, "A"),
            DeckId::B => write!(f, "B"),
        }
    }
}

/// Pull-based transport snapshot for one deck
///
/// Defaults to `{false, 0, 0}`, which is also what queries on an unbound
/// deck return.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeckStatus {
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
}

/// Decoded media ready to load into a deck player
///
/// Samples are interleaved stereo f32 at the engine sample rate; the
/// locator is whatever URI/path the track was resolved from (local files
/// and remote sources are treated uniformly once decoded).
#[derive(Clone)]
pub struct TrackSource {
    pub locator: String,
    pub name: String,
    pub samples: Arc<Vec<f32>>,
    pub sample_rate: u32,
}

/// Playback-rate bounds (shared with the pitch control)
const MIN_RATE: f32 = 0.5;
const MAX_RATE: f32 = 2.0;

/// The media-element equivalent: one playable source with transport state
///
/// Owns the deck's playback state: current locator, playing flag, position,
/// duration, and the playback-rate multiplier that doubles as the pitch
/// control. Rate change is naive: it shifts pitch *and* duration together
/// (no time-stretching) - a documented limitation, not a bug.
pub struct Player {
    samples: Arc<Vec<f32>>,
    sample_rate: u32,
    locator: String,
    name: String,
    /// Position in interleaved sample units (fractional for interpolation)
    position: f64,
    playing: bool,
    rate: f32,
}

impl Player {
    /// Create an empty player with no media loaded
    pub fn new() -> Self {
        Self {
            samples: Arc::new(Vec::new()),
            sample_rate: 0,
            locator: String::new(),
            name: String::new(),
            position: 0.0,
            playing: false,
            rate: 1.0,
        }
    }

    /// Replace the loaded media; resets position and stops playback
    pub fn load(&mut self, source: TrackSource) {
        self.samples = source.samples;
        self.sample_rate = source.sample_rate;
        self.locator = source.locator;
        self.name = source.name;
        self.position = 0.0;
        self.playing = false;
    }

    pub fn has_media(&self) -> bool {
        !self.samples.is_empty()
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start playback; fails when no media is loaded
    pub fn play(&mut self) -> bool {
        if self.has_media() {
            // Restart from the top after a natural end
            if self.position >= self.samples.len() as f64 {
                self.position = 0.0;
            }
            self.playing = true;
        }
        self.playing
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Set the playback-rate multiplier (clamped)
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate.clamp(MIN_RATE, MAX_RATE);
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Track duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * 2.0) // stereo
    }

    /// Current position in seconds
    pub fn current_time(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.position / (self.sample_rate as f64 * 2.0)
    }

    pub fn status(&self) -> DeckStatus {
        DeckStatus {
            is_playing: self.playing,
            current_time: self.current_time(),
            duration: self.duration(),
        }
    }

    /// Render interleaved stereo frames into `output`
    ///
    /// Advances the position by the playback rate. On natural end-of-track
    /// the player stops with the position pinned at the duration so status
    /// consumers (the auto-mix trigger included) observe the track as
    /// finished rather than rewound.
    pub fn render(&mut self, output: &mut [f32]) {
        if !self.playing || self.samples.is_empty() {
            output.fill(0.0);
            return;
        }

        let sample_count = self.samples.len();

        for frame in output.chunks_mut(2) {
            let pos = self.position as usize;

            if pos + 1 >= sample_count {
                // End of track
                self.playing = false;
                self.position = sample_count as f64;
                frame[0] = 0.0;
                frame[1] = 0.0;
                continue;
            }

            // Linear interpolation for smoother playback at non-integer
            // positions; the coefficient comes from the frame index, not the
            // interleaved index
            let frac = (self.position * 0.5).fract() as f32;
            let pos_even = pos & !1; // Ensure we start at the left channel

            if pos_even + 3 < sample_count {
                let l0 = self.samples[pos_even];
                let r0 = self.samples[pos_even + 1];
                let l1 = self.samples[pos_even + 2];
                let r1 = self.samples[pos_even + 3];

                frame[0] = l0 + frac * (l1 - l0);
                frame[1] = r0 + frac * (r1 - r0);
            } else {
                frame[0] = self.samples[pos_even];
                frame[1] = self.samples[pos_even + 1];
            }

            // Advance position based on playback rate
            self.position += 2.0 * self.rate as f64;
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-destructive monitoring point producing frequency data
struct SpectrumTap {
    analyzer: SpectrumAnalyzer,
    snapshot: FrequencyData,
    /// Pre-allocated mono downmix buffer
    mono: Vec<f32>,
}

impl SpectrumTap {
    fn new() -> Self {
        Self {
            analyzer: SpectrumAnalyzer::new(),
            snapshot: FrequencyData::default(),
            mono: Vec::with_capacity(4096),
        }
    }

    /// Feed post-gain stereo samples and refresh the snapshot
    fn feed(&mut self, samples: &[f32]) {
        self.mono.clear();
        for frame in samples.chunks(2) {
            let m = if frame.len() == 2 {
                (frame[0] + frame[1]) * 0.5
            } else {
                frame[0]
            };
            self.mono.push(m);
        }
        self.snapshot = self.analyzer.analyze(&self.mono);
    }

    fn reset(&mut self) {
        self.analyzer.reset();
        self.snapshot = FrequencyData::default();
    }
}

/// One deck's processing chain, in strict series:
/// player -> low shelf -> peaking mid -> high shelf -> channel gain -> tap
pub struct DeckChain {
    player: Player,
    eq: ThreeBandEq,
    gain: SmoothedGain,
    tap: SpectrumTap,
}

impl DeckChain {
    /// Build a chain around a player with the channel gain at `initial_gain`
    pub fn new(sample_rate: u32, player: Player, initial_gain: f32) -> Self {
        Self {
            player,
            eq: ThreeBandEq::new(sample_rate),
            gain: SmoothedGain::new(sample_rate, GAIN_SMOOTHING_SECS, initial_gain),
            tap: SpectrumTap::new(),
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Replace the loaded media and clear filter/tap state
    pub fn load(&mut self, source: TrackSource) {
        self.player.load(source);
        self.eq.reset();
        self.tap.reset();
    }

    pub fn set_eq(&mut self, band: Band, value: f32) {
        self.eq.set(band, value);
    }

    pub fn eq_gain_db(&self, band: Band) -> f32 {
        self.eq.gain_db(band)
    }

    /// Set the crossfade gain target (smoothed, never discontinuous)
    pub fn set_gain_target(&mut self, target: f32) {
        self.gain.set_target(target);
    }

    pub fn gain_target(&self) -> f32 {
        self.gain.target()
    }

    pub fn frequency_data(&self) -> FrequencyData {
        self.tap.snapshot
    }

    /// Render one buffer through the full chain
    pub fn render(&mut self, output: &mut [f32]) {
        self.player.render(output);
        self.eq.process(output);

        for frame in output.chunks_mut(2) {
            let g = self.gain.next();
            for sample in frame {
                *sample *= g;
            }
        }

        // Analyser taps post-gain, like the bus wiring it monitors
        self.tap.feed(output);
    }
}
