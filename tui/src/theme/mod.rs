//! Theme and Colors
//!
//! The polar palette: deep night-water background, ice blues for the card
//! and white snow. Conservation status colors follow the usual traffic-light
//! scale from least concern to critically endangered.

use kiosk_core::{ConservationStatus, NotifyLevel};
use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Polar Palette
// ============================================================================

/// Background - deep arctic water
pub const POLAR_NIGHT: Color = Color::Rgb(12, 24, 48);

/// Card header band
pub const ICE_BLUE: Color = Color::Rgb(59, 130, 246);

/// Card border
pub const FROST: Color = Color::Rgb(147, 197, 253);

/// Headings and field titles
pub const GLACIER: Color = Color::Rgb(191, 219, 254);

/// Body text
pub const SNOW_WHITE: Color = Color::Rgb(240, 248, 255);

/// Secondary text (blurb, hints)
pub const DRIFT_GRAY: Color = Color::Rgb(148, 163, 184);

/// Snowflakes, by size
pub const FLAKE_SMALL: Color = Color::Rgb(120, 140, 170);
/// Medium snowflake
pub const FLAKE_MEDIUM: Color = Color::Rgb(190, 205, 225);
/// Large snowflake
pub const FLAKE_LARGE: Color = Color::Rgb(250, 252, 255);

// ============================================================================
// Status Colors
// ============================================================================

/// Critically endangered
pub const STATUS_CRITICAL: Color = Color::Rgb(239, 68, 68);
/// Endangered
pub const STATUS_ENDANGERED: Color = Color::Rgb(249, 115, 22);
/// Vulnerable
pub const STATUS_VULNERABLE: Color = Color::Rgb(234, 179, 8);
/// Near threatened
pub const STATUS_NEAR_THREATENED: Color = Color::Rgb(250, 204, 21);
/// Least concern
pub const STATUS_LEAST_CONCERN: Color = Color::Rgb(34, 197, 94);
/// Unknown
pub const STATUS_UNKNOWN: Color = Color::Rgb(107, 114, 128);

/// Warning text
pub const WARN_AMBER: Color = Color::Rgb(251, 191, 36);

/// Error text
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Badge color for a conservation status
#[must_use]
pub fn status_color(status: ConservationStatus) -> Color {
    match status {
        ConservationStatus::CriticallyEndangered => STATUS_CRITICAL,
        ConservationStatus::Endangered => STATUS_ENDANGERED,
        ConservationStatus::Vulnerable => STATUS_VULNERABLE,
        ConservationStatus::NearThreatened => STATUS_NEAR_THREATENED,
        ConservationStatus::LeastConcern => STATUS_LEAST_CONCERN,
        ConservationStatus::DataDeficient | ConservationStatus::NotEvaluated => STATUS_UNKNOWN,
    }
}

/// Badge style: status color as background, white text, bold for
/// threatened species
#[must_use]
pub fn status_badge(status: ConservationStatus) -> Style {
    let style = Style::default().bg(status_color(status)).fg(Color::White);
    if status.is_threatened() {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

/// Text color for a status-bar notification
#[must_use]
pub fn notify_color(level: NotifyLevel) -> Color {
    match level {
        NotifyLevel::Info => GLACIER,
        NotifyLevel::Warning => WARN_AMBER,
        NotifyLevel::Error => ERROR_RED,
    }
}
