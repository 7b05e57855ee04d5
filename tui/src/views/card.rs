//! Card layout: header band, name and status badge, facts on the left,
//! fun fact on the right, blurb across the bottom.

use kiosk_core::Specimen;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout as Split, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders, Widget};

use super::{facts, or_dash, SpecimenView, HEADER, WELCOME_TEXT, WELCOME_TITLE};
use crate::theme::{status_badge, DRIFT_GRAY, FROST, GLACIER, ICE_BLUE, POLAR_NIGHT, SNOW_WHITE};
use crate::widgets::TextBlock;

/// Width of the fact label column
const LABEL_WIDTH: u16 = 10;

/// Smallest body that fits heading, facts and blurb
const MIN_BODY: (u16, u16) = (24, 11);

/// Two-column specimen card
#[derive(Clone, Copy, Debug, Default)]
pub struct CardView;

impl SpecimenView for CardView {
    fn name(&self) -> &'static str {
        "card"
    }

    fn render(&self, specimen: Option<&Specimen>, area: Rect, buf: &mut Buffer) {
        if area.width < 4 || area.height < 3 {
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(FROST))
            .style(Style::default().bg(POLAR_NIGHT));
        let inner = block.inner(area);
        block.render(area, buf);

        // Header band
        let band = Rect::new(inner.x, inner.y, inner.width, 1_u16.min(inner.height));
        buf.set_style(band, Style::default().bg(ICE_BLUE));
        TextBlock::new(HEADER)
            .style(
                Style::default()
                    .fg(SNOW_WHITE)
                    .bg(ICE_BLUE)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .render(band, buf);

        let body = Rect::new(
            inner.x + 1,
            inner.y + 2,
            inner.width.saturating_sub(2),
            inner.height.saturating_sub(3),
        );
        match specimen {
            Some(specimen) => render_specimen(specimen, body, buf),
            None => render_welcome(body, buf),
        }
    }
}

fn render_welcome(area: Rect, buf: &mut Buffer) {
    let rows = Split::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);

    TextBlock::new(WELCOME_TITLE)
        .style(Style::default().fg(GLACIER).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .render(rows[1], buf);
    TextBlock::new(WELCOME_TEXT)
        .style(Style::default().fg(SNOW_WHITE))
        .alignment(Alignment::Center)
        .render(rows[2], buf);
}

fn render_specimen(specimen: &Specimen, area: Rect, buf: &mut Buffer) {
    // Too small for the full card (mid pop-in or a tiny terminal)
    if area.width < MIN_BODY.0 || area.height < MIN_BODY.1 {
        render_heading(specimen, area, buf);
        return;
    }

    let rows = Split::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(5),
            Constraint::Length(4),
        ])
        .split(area);

    render_heading(specimen, rows[0], buf);

    let columns = Split::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let facts_area = columns[0];
    let label_style = Style::default().fg(GLACIER).add_modifier(Modifier::BOLD);
    let value_style = Style::default().fg(SNOW_WHITE);
    let mut y = facts_area.y;
    for (label, value) in facts(specimen) {
        if y >= facts_area.y + facts_area.height {
            break;
        }
        let value_area = Rect::new(
            facts_area.x + LABEL_WIDTH,
            y,
            facts_area.width.saturating_sub(LABEL_WIDTH + 1),
            2_u16.min(facts_area.y + facts_area.height - y),
        );
        buf.set_stringn(facts_area.x, y, label, LABEL_WIDTH as usize, label_style);
        let text = TextBlock::new(or_dash(value)).style(value_style);
        let used = text.height(value_area.width).clamp(1, value_area.height.max(1));
        text.render(value_area, buf);
        y += used;
    }

    let fact_area = columns[1];
    buf.set_stringn(fact_area.x, fact_area.y, "Fun Fact", fact_area.width as usize, label_style);
    TextBlock::new(or_dash(&specimen.fun_fact))
        .style(value_style)
        .render(
            Rect::new(
                fact_area.x,
                fact_area.y + 1,
                fact_area.width,
                fact_area.height.saturating_sub(1),
            ),
            buf,
        );

    TextBlock::new(&specimen.blurb)
        .style(Style::default().fg(DRIFT_GRAY).add_modifier(Modifier::ITALIC))
        .render(rows[2], buf);
}

/// Name on the first row, status badge right-aligned after it, or on the
/// next row when the name leaves no room
fn render_heading(specimen: &Specimen, area: Rect, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let name = specimen.display_name();
    let name_style = Style::default().fg(SNOW_WHITE).add_modifier(Modifier::BOLD);
    let (x, _) = buf.set_stringn(area.x, area.y, &name, area.width as usize, name_style);

    let status = specimen.conservation_status();
    let badge = format!(" {} ", status.label());
    let right = area.x + area.width;
    let badge_width = u16::try_from(badge.len()).unwrap_or(u16::MAX);
    let (badge_x, badge_y) = if x.saturating_add(1).saturating_add(badge_width) <= right {
        (right - badge_width, area.y)
    } else {
        (area.x, area.y + 1)
    };
    if badge_y < area.y + area.height {
        buf.set_stringn(
            badge_x,
            badge_y,
            &badge,
            (right - badge_x) as usize,
            status_badge(status),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(buf: &Buffer) -> String {
        let area = buf.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_idle_card_shows_welcome() {
        let area = Rect::new(0, 0, 70, 20);
        let mut buf = Buffer::empty(area);
        CardView.render(None, area, &mut buf);

        let out = text(&buf);
        assert!(out.contains(HEADER));
        assert!(out.contains(WELCOME_TITLE));
    }

    #[test]
    fn test_specimen_card_shows_fields() {
        let specimen = Specimen {
            id: 2,
            name: "Arctic Cod".into(),
            average_size: "25 cm".into(),
            habitat: "Sea ice".into(),
            endangered_status: "Least Concern".into(),
            fun_fact: "Antifreeze proteins".into(),
            ..Default::default()
        };
        let area = Rect::new(0, 0, 80, 22);
        let mut buf = Buffer::empty(area);
        CardView.render(Some(&specimen), area, &mut buf);

        let out = text(&buf);
        assert!(out.contains("Arctic Cod"));
        assert!(out.contains("Least Concern"));
        assert!(out.contains("25 cm"));
        assert!(out.contains("Fun Fact"));
        assert!(out.contains("Antifreeze"));
        assert!(!out.contains(WELCOME_TITLE));
    }

    #[test]
    fn test_short_card_keeps_the_name() {
        let specimen = Specimen {
            name: "Arctic Char".into(),
            endangered_status: "Least Concern".into(),
            ..Default::default()
        };
        let area = Rect::new(0, 0, 22, 3);
        let mut buf = Buffer::empty(area);
        render_specimen(&specimen, area, &mut buf);

        let out = text(&buf);
        assert!(out.contains("Arctic Char"));
        assert!(out.contains("Least"));
        assert!(!out.contains("Fun Fact"));
    }

    #[test]
    fn test_tiny_area_is_noop() {
        let area = Rect::new(0, 0, 3, 2);
        let mut buf = Buffer::empty(area);
        CardView.render(None, area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }
}
