//! Spectrum widget - per-deck frequency bars

use crate::theme::Theme;
use booth_analysis::{FrequencyData, SPECTRUM_BINS};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Span,
    widgets::{Block, Borders, Widget},
};

/// Characters for vertical bar rendering (8 levels)
const BAR_CHARS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Side-by-side spectrum bars for both decks
pub struct SpectrumWidget<'a> {
    spectrum_a: &'a FrequencyData,
    spectrum_b: &'a FrequencyData,
    theme: &'a Theme,
}

impl<'a> SpectrumWidget<'a> {
    pub fn new(
        spectrum_a: &'a FrequencyData,
        spectrum_b: &'a FrequencyData,
        theme: &'a Theme,
    ) -> Self {
        Self {
            spectrum_a,
            spectrum_b,
            theme,
        }
    }

    /// Full-height bar column, bottom to top
    fn render_bar(magnitude: f32, height: u16) -> Vec<char> {
        let total_levels = (magnitude.clamp(0.0, 1.0) * 8.0 * height as f32) as usize;
        let full_blocks = total_levels / 8;
        let partial = total_levels % 8;

        (0..height as usize)
            .map(|row| {
                if row < full_blocks {
                    '█'
                } else if row == full_blocks && partial > 0 {
                    BAR_CHARS[partial]
                } else {
                    ' '
                }
            })
            .collect()
    }
}

impl Widget for SpectrumWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border())
            .title(Span::styled(" SPECTRUM ", self.theme.title()));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 2 || inner.width < 8 {
            return;
        }

        let width = inner.width as usize;
        let height = inner.height as usize;

        // Two columns per band: deck A then deck B
        let bands_to_show = (width / 2).min(SPECTRUM_BINS);
        let start_x = (width.saturating_sub(bands_to_show * 2)) / 2;

        for band in 0..bands_to_show {
            let bin_idx = (band * SPECTRUM_BINS) / bands_to_show;
            let mag_a = self.spectrum_a.bins[bin_idx] as f32 / 255.0;
            let mag_b = self.spectrum_b.bins[bin_idx] as f32 / 255.0;

            let bar_a = Self::render_bar(mag_a, height as u16);
            let bar_b = Self::render_bar(mag_b, height as u16);

            let x_a = inner.x + (start_x + band * 2) as u16;
            let x_b = x_a + 1;

            for row in 0..height {
                let y = inner.y + inner.height - 1 - row as u16;

                if bar_a[row] != ' ' {
                    buf[(x_a, y)]
                        .set_char(bar_a[row])
                        .set_style(self.theme.spectrum_style(bin_idx, SPECTRUM_BINS));
                }
                if bar_b[row] != ' ' && x_b < inner.x + inner.width {
                    buf[(x_b, y)]
                        .set_char(bar_b[row])
                        .set_style(self.theme.deck_style(booth_audio::DeckId::B));
                }
            }
        }
    }
}
