//! UI state

use crate::theme::{Theme, CONSOLE_AMBER, CONSOLE_GREEN};
use booth_audio::DeckId;
use std::collections::VecDeque;

/// Frames of bass-energy history kept for the rhythm graph
pub const RHYTHM_HISTORY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Warning,
    Error,
}

/// Per-frame presentation state; everything audible lives in the engine
pub struct App {
    pub theme: Theme,
    pub focused: DeckId,
    pub message: Option<(String, MessageType)>,
    pub selected: usize,
    pub folder_index: usize,
    pub rhythm_a: VecDeque<u8>,
    pub rhythm_b: VecDeque<u8>,
    /// Platter rotation phase per deck (visual only)
    pub platter_a: f32,
    pub platter_b: f32,
    pub should_quit: bool,
}

impl App {
    pub fn new() -> Self {
        Self {
            theme: Theme::default(),
            focused: DeckId::A,
            message: None,
            selected: 0,
            folder_index: 0,
            rhythm_a: VecDeque::with_capacity(RHYTHM_HISTORY),
            rhythm_b: VecDeque::with_capacity(RHYTHM_HISTORY),
            platter_a: 0.0,
            platter_b: 0.0,
            should_quit: false,
        }
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some((msg.into(), MessageType::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.message = Some((msg.into(), MessageType::Warning));
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.message = Some((msg.into(), MessageType::Error));
    }

    pub fn toggle_theme(&mut self) {
        self.theme = if self.theme.name == CONSOLE_GREEN.name {
            CONSOLE_AMBER
        } else {
            CONSOLE_GREEN
        };
    }

    pub fn select_next(&mut self, list_len: usize) {
        if list_len > 0 && self.selected + 1 < list_len {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Record one frame of bass energy for the rhythm graph
    pub fn push_rhythm(&mut self, bass_a: u8, bass_b: u8) {
        if self.rhythm_a.len() == RHYTHM_HISTORY {
            self.rhythm_a.pop_front();
        }
        if self.rhythm_b.len() == RHYTHM_HISTORY {
            self.rhythm_b.pop_front();
        }
        self.rhythm_a.push_back(bass_a);
        self.rhythm_b.push_back(bass_b);
    }

    /// Advance platter rotation by each deck's playback rate
    pub fn spin_platters(&mut self, rate_a: Option<f32>, rate_b: Option<f32>) {
        if let Some(rate) = rate_a {
            self.platter_a = (self.platter_a + rate) % 4.0;
        }
        if let Some(rate) = rate_b {
            self.platter_b = (self.platter_b + rate) % 4.0;
        }
    }

    pub fn platter_phase(&self, deck: DeckId) -> usize {
        let phase = match deck {
            DeckId::A => self.platter_a,
            DeckId::B => self.platter_b,
        };
        phase as usize % 4
    }
}
