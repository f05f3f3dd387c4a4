//! Sampler pad bank widget

use crate::console::Pad;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub struct PadsWidget<'a> {
    pads: &'a [Pad],
    active_voices: usize,
    theme: &'a Theme,
}

impl<'a> PadsWidget<'a> {
    pub fn new(pads: &'a [Pad], active_voices: usize, theme: &'a Theme) -> Self {
        Self {
            pads,
            active_voices,
            theme,
        }
    }
}

impl Widget for PadsWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.active_voices > 0 {
            format!(" PADS ({} playing) ", self.active_voices)
        } else {
            " PADS ".to_string()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border())
            .title(Span::styled(title, self.theme.title()));

        let inner = block.inner(area);
        block.render(area, buf);

        if self.pads.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "no samples found",
                self.theme.dim(),
            )))
            .render(inner, buf);
            return;
        }

        let mut spans = Vec::new();
        for (i, pad) in self.pads.iter().enumerate() {
            spans.push(Span::styled(format!("{}", i + 1), self.theme.highlight()));
            spans.push(Span::styled(format!(":{}  ", pad.name), self.theme.normal()));
        }
        Paragraph::new(Line::from(spans)).render(inner, buf);
    }
}
