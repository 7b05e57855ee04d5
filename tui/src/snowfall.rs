//! Snowfall Renderer
//!
//! Draws the kiosk's active particles. Each particle's animation progress
//! picks the row (top to bottom), its horizontal percentage picks the
//! column, and its size within the configured range picks the glyph.
//! Particles still waiting out their delay are not drawn.

use kiosk_core::{Particle, ValueRange};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;
use tokio::time::Instant;

use crate::theme::{FLAKE_LARGE, FLAKE_MEDIUM, FLAKE_SMALL};

/// Glyphs from smallest to largest
const FLAKES: [(&str, ratatui::style::Color); 3] =
    [("·", FLAKE_SMALL), ("*", FLAKE_MEDIUM), ("❄", FLAKE_LARGE)];

/// Snowfall widget over a particle snapshot
pub struct Snowfall<'a> {
    particles: &'a [Particle],
    now: Instant,
    sizes: ValueRange,
}

impl<'a> Snowfall<'a> {
    /// Draw `particles` as they are at `now`
    pub fn new(particles: &'a [Particle], now: Instant, sizes: ValueRange) -> Self {
        Self {
            particles,
            now,
            sizes,
        }
    }

    /// Cell a particle occupies in `area`, if it is falling
    pub fn cell_for(&self, particle: &Particle, area: Rect) -> Option<(u16, u16)> {
        if area.width == 0 || area.height == 0 {
            return None;
        }
        let progress = particle.progress(self.now)?;

        let row = scale(progress, area.height);
        let col = scale(particle.x_percent / 100.0, area.width);
        Some((area.x + col, area.y + row))
    }

    fn glyph(&self, size: f32) -> (&'static str, ratatui::style::Color) {
        let span = self.sizes.max - self.sizes.min;
        let t = if span > 0.0 {
            ((size - self.sizes.min) / span).clamp(0.0, 1.0)
        } else {
            0.5
        };
        let index = ((t * FLAKES.len() as f32) as usize).min(FLAKES.len() - 1);
        FLAKES[index]
    }
}

/// Map 0.0..=1.0 onto 0..len
fn scale(t: f32, len: u16) -> u16 {
    let max = len.saturating_sub(1);
    ((t.clamp(0.0, 1.0) * f32::from(len)) as u16).min(max)
}

impl Widget for Snowfall<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for particle in self.particles {
            let Some((x, y)) = self.cell_for(particle, area) else {
                continue;
            };
            let (symbol, color) = self.glyph(particle.size);
            buf[(x, y)].set_symbol(symbol).set_style(Style::default().fg(color));
        }
    }
}
