//! Rhythm graph widget - bass-energy history per deck

use crate::theme::Theme;
use booth_audio::DeckId;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Span,
    widgets::{Block, Borders, Widget},
};
use std::collections::VecDeque;

const BAR_CHARS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Scrolling bass-energy sparkline, one row per deck
///
/// Fed from the low bins of each deck's frequency snapshot; newest value is
/// rightmost.
pub struct RhythmWidget<'a> {
    history_a: &'a VecDeque<u8>,
    history_b: &'a VecDeque<u8>,
    theme: &'a Theme,
}

impl<'a> RhythmWidget<'a> {
    pub fn new(history_a: &'a VecDeque<u8>, history_b: &'a VecDeque<u8>, theme: &'a Theme) -> Self {
        Self {
            history_a,
            history_b,
            theme,
        }
    }

    fn render_row(
        &self,
        history: &VecDeque<u8>,
        deck: DeckId,
        inner: Rect,
        y: u16,
        buf: &mut Buffer,
    ) {
        let label = match deck {
            DeckId::A => 'A',
            DeckId::B => 'B',
        };
        buf[(inner.x, y)]
            .set_char(label)
            .set_style(self.theme.deck_style(deck));

        let width = inner.width.saturating_sub(2) as usize;
        let values: Vec<u8> = history.iter().rev().take(width).copied().collect();
        for (offset, &value) in values.iter().enumerate() {
            // Newest sample at the right edge
            let x = inner.x + inner.width - 1 - offset as u16;
            let level = (value as usize * 8) / 255;
            buf[(x, y)]
                .set_char(BAR_CHARS[level])
                .set_style(self.theme.deck_style(deck));
        }
    }
}

impl Widget for RhythmWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border())
            .title(Span::styled(" RHYTHM ", self.theme.title()));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 2 || inner.width < 4 {
            return;
        }

        self.render_row(self.history_a, DeckId::A, inner, inner.y, buf);
        self.render_row(self.history_b, DeckId::B, inner, inner.y + 1, buf);
    }
}
