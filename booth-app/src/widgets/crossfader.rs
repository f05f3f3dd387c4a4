//! Crossfader widget

use crate::theme::Theme;
use booth_audio::{crossfade_gains, DeckId};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Span,
    widgets::{Block, Borders, Widget},
};

/// Horizontal fader with the equal-power channel gains above it
pub struct CrossfaderWidget<'a> {
    /// 0.0 is full deck A, 1.0 full deck B
    position: f32,
    automix: bool,
    theme: &'a Theme,
}

impl<'a> CrossfaderWidget<'a> {
    pub fn new(position: f32, theme: &'a Theme) -> Self {
        Self {
            position,
            automix: false,
            theme,
        }
    }

    pub fn automix(mut self, enabled: bool) -> Self {
        self.automix = enabled;
        self
    }
}

impl Widget for CrossfaderWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.automix {
            " CROSSFADER [AUTO] "
        } else {
            " CROSSFADER "
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border())
            .title(Span::styled(title, self.theme.title()));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < 10 || inner.height < 1 {
            return;
        }

        let width = inner.width as usize;

        // Row 0: current channel gains
        let (gain_a, gain_b) = crossfade_gains(self.position);
        let gain_line = format!("A:{gain_a:.2}      B:{gain_b:.2}");
        let gx = inner.x + (width.saturating_sub(gain_line.len())) as u16 / 2;
        for (i, ch) in gain_line.chars().enumerate() {
            let x = gx + i as u16;
            if x < inner.x + inner.width {
                let style = if i < gain_line.len() / 2 {
                    self.theme.deck_style(DeckId::A)
                } else {
                    self.theme.deck_style(DeckId::B)
                };
                buf[(x, inner.y)].set_char(ch).set_style(style);
            }
        }
        if inner.height < 2 {
            return;
        }

        let fader_pos = (self.position.clamp(0.0, 1.0) * (width - 1) as f32) as usize;

        let mut line = String::with_capacity(width);
        line.push('A');
        for i in 1..width - 1 {
            if i == fader_pos {
                line.push('●');
            } else if i == width / 2 {
                line.push('┼');
            } else {
                line.push('─');
            }
        }
        line.push('B');

        let y = inner.y + 1;
        for (i, ch) in line.chars().enumerate() {
            let x = inner.x + i as u16;
            let style = match ch {
                'A' => self.theme.deck_style(DeckId::A),
                'B' => self.theme.deck_style(DeckId::B),
                '●' => self.theme.highlight(),
                '┼' => self.theme.dim(),
                _ => self.theme.normal(),
            };
            buf[(x, y)].set_char(ch).set_style(style);
        }
    }
}
