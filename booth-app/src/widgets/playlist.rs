//! Playlist pane widget

use crate::theme::Theme;
use booth_library::Track;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub struct PlaylistWidget<'a> {
    tracks: &'a [Track],
    selected: usize,
    folder: &'a str,
    theme: &'a Theme,
}

impl<'a> PlaylistWidget<'a> {
    pub fn new(tracks: &'a [Track], selected: usize, folder: &'a str, theme: &'a Theme) -> Self {
        Self {
            tracks,
            selected,
            folder,
            theme,
        }
    }
}

impl Widget for PlaylistWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border())
            .title(Span::styled(
                format!(" QUEUE [{}] ({}) ", self.folder, self.tracks.len()),
                self.theme.title(),
            ));

        let inner = block.inner(area);
        block.render(area, buf);

        if self.tracks.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "queue empty - pass a music directory on the command line",
                self.theme.dim(),
            )))
            .render(inner, buf);
            return;
        }

        // Keep the selection visible
        let visible = inner.height as usize;
        let first = if self.selected >= visible {
            self.selected + 1 - visible
        } else {
            0
        };

        let lines: Vec<Line> = self
            .tracks
            .iter()
            .enumerate()
            .skip(first)
            .take(visible)
            .map(|(i, track)| {
                let style = if i == self.selected {
                    self.theme.highlight()
                } else {
                    self.theme.normal()
                };
                Line::from(Span::styled(format!("{:>3}  {}", i + 1, track.name), style))
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}
