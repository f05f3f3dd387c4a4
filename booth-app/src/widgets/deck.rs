//! Deck panel widget - transport, platter, EQ readout

use crate::theme::Theme;
use booth_audio::{DeckId, DeckStatus};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Platter rotation frames
const PLATTER: [char; 4] = ['|', '/', '-', '\\'];

pub struct DeckWidget<'a> {
    deck: DeckId,
    status: DeckStatus,
    track_name: Option<String>,
    pitch: f32,
    /// Low/mid/high gains in dB
    eq_db: [f32; 3],
    platter_phase: usize,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> DeckWidget<'a> {
    pub fn new(deck: DeckId, status: DeckStatus, theme: &'a Theme) -> Self {
        Self {
            deck,
            status,
            track_name: None,
            pitch: 1.0,
            eq_db: [0.0; 3],
            platter_phase: 0,
            focused: false,
            theme,
        }
    }

    pub fn track_name(mut self, name: Option<String>) -> Self {
        self.track_name = name;
        self
    }

    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn eq_db(mut self, low: f32, mid: f32, high: f32) -> Self {
        self.eq_db = [low, mid, high];
        self
    }

    pub fn platter_phase(mut self, phase: usize) -> Self {
        self.platter_phase = phase;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

fn format_time(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

impl Widget for DeckWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            self.theme.border_active()
        } else {
            self.theme.border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(
                format!(" DECK {} ", self.deck),
                self.theme.deck_style(self.deck),
            ));

        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height < 2 {
            return;
        }

        let platter = if self.status.is_playing {
            PLATTER[self.platter_phase % PLATTER.len()]
        } else {
            'o'
        };
        let name = self.track_name.as_deref().unwrap_or("-- no track --");

        let transport = if self.status.is_playing {
            Span::styled("PLAYING", self.theme.deck_style(self.deck))
        } else if self.status.duration > 0.0 {
            Span::styled("PAUSED", self.theme.dim())
        } else {
            Span::styled("EMPTY", self.theme.dim())
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled(format!("({platter}) "), self.theme.deck_style(self.deck)),
                Span::styled(name, self.theme.normal()),
            ]),
            Line::from(vec![
                transport,
                Span::styled(
                    format!(
                        "  {} / {}",
                        format_time(self.status.current_time),
                        format_time(self.status.duration)
                    ),
                    self.theme.normal(),
                ),
            ]),
            Line::from(Span::styled(
                format!(
                    "EQ  L{:+05.1}  M{:+05.1}  H{:+05.1} dB",
                    self.eq_db[0], self.eq_db[1], self.eq_db[2]
                ),
                self.theme.dim(),
            )),
            Line::from(Span::styled(
                format!("PITCH x{:.2}", self.pitch),
                self.theme.dim(),
            )),
        ];

        // Progress bar on the last row
        if self.status.duration > 0.0 && inner.height as usize > lines.len() {
            let width = inner.width as usize;
            let progress = (self.status.current_time / self.status.duration).clamp(0.0, 1.0);
            let filled = (progress * width as f64) as usize;
            let bar: String = (0..width)
                .map(|i| if i < filled { '█' } else { '░' })
                .collect();
            lines.push(Line::from(Span::styled(
                bar,
                self.theme.deck_style(self.deck),
            )));
        }

        Paragraph::new(lines).render(inner, buf);
    }
}
