//! TextBlock Widget
//!
//! A borderless wrapped text region. Text that doesn't fit is cut at the
//! last visible line with an ellipsis, since a kiosk display has nobody to
//! scroll it.

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::widgets::Widget;
use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

/// A borderless, wrapped, clipped text block
pub struct TextBlock<'a> {
    content: &'a str,
    style: Style,
    alignment: Alignment,
}

impl<'a> TextBlock<'a> {
    /// Wrap `content` into the render area
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            style: Style::default(),
            alignment: Alignment::Left,
        }
    }

    /// Text style
    #[must_use]
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Horizontal alignment of each line
    #[must_use]
    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Lines the content wraps into at `width`
    #[must_use]
    pub fn wrapped_lines(&self, width: u16) -> Vec<String> {
        if width == 0 {
            return Vec::new();
        }
        self.content
            .lines()
            .flat_map(|line| {
                if line.is_empty() {
                    vec![String::new()]
                } else {
                    wrap(line, width as usize)
                        .into_iter()
                        .map(|cow| cow.to_string())
                        .collect()
                }
            })
            .collect()
    }

    /// Height needed to show everything at `width`
    #[must_use]
    pub fn height(&self, width: u16) -> u16 {
        u16::try_from(self.wrapped_lines(width).len()).unwrap_or(u16::MAX)
    }
}

impl Widget for TextBlock<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let mut lines = self.wrapped_lines(area.width);
        let visible = area.height as usize;
        if lines.len() > visible {
            lines.truncate(visible);
            if let Some(last) = lines.last_mut() {
                *last = with_ellipsis(last, area.width as usize);
            }
        }

        for (i, line) in lines.iter().enumerate() {
            let width = UnicodeWidthStr::width(line.as_str()).min(area.width as usize);
            let slack = area.width.saturating_sub(width as u16);
            let x = match self.alignment {
                Alignment::Left => area.x,
                Alignment::Center => area.x + slack / 2,
                Alignment::Right => area.x + slack,
            };
            buf.set_stringn(x, area.y + i as u16, line, area.width as usize, self.style);
        }
    }
}

fn with_ellipsis(line: &str, width: usize) -> String {
    let mut out: String = line.chars().take(width.saturating_sub(1)).collect();
    while UnicodeWidthStr::width(out.as_str()) + 1 > width && out.pop().is_some() {}
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_wraps_to_width() {
        let block = TextBlock::new("lives in very cold water");
        assert_eq!(
            block.wrapped_lines(10),
            vec!["lives in", "very cold", "water"]
        );
        assert_eq!(block.height(10), 3);
    }

    #[test]
    fn test_overflow_gets_ellipsis() {
        let area = Rect::new(0, 0, 10, 2);
        let mut buf = Buffer::empty(area);
        TextBlock::new("lives in very cold water").render(area, &mut buf);

        assert_eq!(row(&buf, 0), "lives in  ");
        assert!(row(&buf, 1).contains('…'));
    }

    #[test]
    fn test_center_alignment() {
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        TextBlock::new("cod")
            .alignment(Alignment::Center)
            .render(area, &mut buf);
        assert_eq!(row(&buf, 0), "   cod    ");
    }

    #[test]
    fn test_zero_area_is_noop() {
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        TextBlock::new("anything").render(area, &mut buf);
    }
}
