//! Compact layout: one column, no border. For portrait displays and
//! terminals too narrow for the card.

use kiosk_core::Specimen;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Widget;

use super::{facts, or_dash, SpecimenView, HEADER, WELCOME_TEXT, WELCOME_TITLE};
use crate::theme::{status_badge, DRIFT_GRAY, GLACIER, ICE_BLUE, SNOW_WHITE};
use crate::widgets::TextBlock;

/// Single-column specimen view
#[derive(Clone, Copy, Debug, Default)]
pub struct CompactView;

impl SpecimenView for CompactView {
    fn name(&self) -> &'static str {
        "compact"
    }

    fn render(&self, specimen: Option<&Specimen>, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;
        let bottom = area.y + area.height;
        buf.set_stringn(
            area.x,
            area.y,
            HEADER,
            width,
            Style::default().fg(ICE_BLUE).add_modifier(Modifier::BOLD),
        );
        let mut y = area.y + 2;

        let Some(specimen) = specimen else {
            if y < bottom {
                buf.set_stringn(area.x, y, WELCOME_TITLE, width, Style::default().fg(GLACIER));
            }
            let rest = Rect::new(area.x, y + 1, area.width, bottom.saturating_sub(y + 1));
            TextBlock::new(WELCOME_TEXT)
                .style(Style::default().fg(SNOW_WHITE))
                .render(rest, buf);
            return;
        };

        if y < bottom {
            buf.set_stringn(
                area.x,
                y,
                specimen.display_name(),
                width,
                Style::default().fg(SNOW_WHITE).add_modifier(Modifier::BOLD),
            );
            y += 1;
        }
        if y < bottom {
            let status = specimen.conservation_status();
            buf.set_stringn(area.x, y, format!(" {} ", status.label()), width, status_badge(status));
            y += 2;
        }

        let label_style = Style::default().fg(GLACIER);
        let value_style = Style::default().fg(SNOW_WHITE);
        let fun_fact = ("Fun Fact", specimen.fun_fact.as_str());
        for (label, value) in facts(specimen).into_iter().chain(std::iter::once(fun_fact)) {
            if y >= bottom {
                return;
            }
            let (x, _) = buf.set_stringn(area.x, y, format!("{label}: "), width, label_style);
            let remaining = (area.x + area.width).saturating_sub(x) as usize;
            buf.set_stringn(x, y, or_dash(value), remaining, value_style);
            y += 1;
        }

        if y + 1 < bottom {
            TextBlock::new(&specimen.blurb)
                .style(Style::default().fg(DRIFT_GRAY))
                .alignment(Alignment::Left)
                .render(Rect::new(area.x, y + 1, area.width, bottom - y - 1), buf);
        }
    }
}
