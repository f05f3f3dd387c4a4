//! Console color themes

use ratatui::style::{Color, Modifier, Style};

/// Theme configuration for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    /// Primary foreground color (text, borders)
    pub fg: Color,
    /// Dimmed foreground (secondary text)
    pub fg_dim: Color,
    /// Background color
    pub bg: Color,
    /// Highlight color (selected items, active elements)
    pub highlight: Color,
    /// Accent color (meters, spectrum peaks)
    pub accent: Color,
    /// Warning color
    pub warning: Color,
    /// Error/danger color
    pub danger: Color,
    /// Deck A color
    pub deck_a: Color,
    /// Deck B color
    pub deck_b: Color,
}

impl Theme {
    pub fn normal(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.fg_dim).bg(self.bg)
    }

    pub fn highlight(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.fg_dim)
    }

    pub fn border_active(&self) -> Style {
        Style::default().fg(self.highlight)
    }

    pub fn deck_style(&self, deck: booth_audio::DeckId) -> Style {
        match deck {
            booth_audio::DeckId::A => Style::default().fg(self.deck_a),
            booth_audio::DeckId::B => Style::default().fg(self.deck_b),
        }
    }

    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for spectrum bars based on frequency band position
    pub fn spectrum_style(&self, band: usize, total_bands: usize) -> Style {
        let ratio = band as f32 / total_bands as f32;
        let color = if ratio < 0.33 {
            self.deck_a
        } else if ratio < 0.66 {
            self.accent
        } else {
            self.deck_b
        };
        Style::default().fg(color)
    }
}

/// Phosphor green console theme
pub const CONSOLE_GREEN: Theme = Theme {
    name: "green",
    fg: Color::Rgb(51, 255, 51),
    fg_dim: Color::Rgb(25, 128, 25),
    bg: Color::Rgb(0, 10, 0),
    highlight: Color::Rgb(180, 255, 180),
    accent: Color::Rgb(100, 255, 100),
    warning: Color::Rgb(255, 255, 100),
    danger: Color::Rgb(255, 100, 100),
    deck_a: Color::Rgb(100, 255, 150),
    deck_b: Color::Rgb(150, 255, 100),
};

/// Amber monochrome theme
pub const CONSOLE_AMBER: Theme = Theme {
    name: "amber",
    fg: Color::Rgb(255, 176, 0),
    fg_dim: Color::Rgb(128, 88, 0),
    bg: Color::Rgb(10, 5, 0),
    highlight: Color::Rgb(255, 220, 128),
    accent: Color::Rgb(255, 200, 64),
    warning: Color::Rgb(255, 255, 100),
    danger: Color::Rgb(255, 100, 100),
    deck_a: Color::Rgb(255, 180, 50),
    deck_b: Color::Rgb(255, 220, 100),
};

impl Default for Theme {
    fn default() -> Self {
        CONSOLE_GREEN
    }
}
