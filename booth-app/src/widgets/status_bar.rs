//! Status bar widget - messages and key hints

use crate::app::MessageType;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

pub struct StatusBarWidget<'a> {
    message: Option<&'a (String, MessageType)>,
    theme: &'a Theme,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(message: Option<&'a (String, MessageType)>, theme: &'a Theme) -> Self {
        Self { message, theme }
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        let chunks = Layout::horizontal([
            Constraint::Min(20),    // Message area
            Constraint::Length(46), // Key hints
        ])
        .split(area);

        let content = match self.message {
            Some((msg, msg_type)) => {
                let style = match msg_type {
                    MessageType::Info => self.theme.dim(),
                    MessageType::Warning => Style::default().fg(self.theme.warning),
                    MessageType::Error => Style::default().fg(self.theme.danger),
                };
                Line::from(Span::styled(msg.as_str(), style))
            }
            None => Line::from(Span::styled("ready", self.theme.dim())),
        };
        Paragraph::new(content).render(chunks[0], buf);

        let hints = Line::from(Span::styled(
            "space:play  m:auto  \u{2190}\u{2192}:fader  1-9:pads  q:quit",
            self.theme.dim(),
        ));
        Paragraph::new(hints).render(chunks[1], buf);
    }
}
