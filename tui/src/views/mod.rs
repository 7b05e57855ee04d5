//! Specimen Views
//!
//! A view turns the kiosk's current specimen (or its absence) into cells.
//! The app owns one view for the session, chosen with `--layout`; both
//! layouts draw the same fields and the same idle welcome.

mod card;
mod compact;

use kiosk_core::Specimen;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

pub use card::CardView;
pub use compact::CompactView;

/// Heading shown above every specimen
pub const HEADER: &str = "Polar Fish Explorer";

/// Idle title
pub const WELCOME_TITLE: &str = "Welcome to Polar Ice Fishing";

/// Idle body text
pub const WELCOME_TEXT: &str = "Dive into the fascinating world of fish! Catch a fish, \
scan it, and uncover fascinating facts about your unique catch.";

/// Renders the specimen panel
pub trait SpecimenView {
    /// Name for logs and `--layout`
    fn name(&self) -> &'static str;

    /// Draw `specimen`, or the welcome screen when there is none
    fn render(&self, specimen: Option<&Specimen>, area: Rect, buf: &mut Buffer);
}

/// Available layouts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Layout {
    /// Two-column card with a header band
    #[default]
    Card,
    /// Single column for small terminals
    Compact,
}

/// Build the view for a layout
pub fn view_for(layout: Layout) -> Box<dyn SpecimenView> {
    match layout {
        Layout::Card => Box::new(CardView),
        Layout::Compact => Box::new(CompactView),
    }
}

/// Labelled facts in display order
pub(crate) fn facts(specimen: &Specimen) -> [(&'static str, &str); 5] {
    [
        ("Size", specimen.average_size.as_str()),
        ("Weight", specimen.average_weight.as_str()),
        ("Lifespan", specimen.average_lifespan.as_str()),
        ("Habitat", specimen.habitat.as_str()),
        ("Diet", specimen.diet.as_str()),
    ]
}

/// Placeholder for fields the catalog left empty
pub(crate) fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "—"
    } else {
        value
    }
}
