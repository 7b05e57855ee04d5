//! Polar Kiosk - terminal display for the polar fish kiosk
//!
//! A full-screen terminal UI over the headless `kiosk-core`: scanned
//! specimens pop in on a card over gently falling snow, and return to the
//! welcome screen when their display time runs out.
//!
//! # Architecture
//!
//! - **Compositor**: Layered rendering with z-ordering (snow, card, status)
//! - **Views**: Card and compact specimen layouts
//! - **Snowfall**: Particle positions mapped onto cells
//! - **Widgets**: Borderless wrapped text blocks
//! - **Window**: xterm fullscreen requests for the hosting terminal

pub mod app;
pub mod cli;
pub mod compositor;
pub mod display;
pub mod snowfall;
pub mod theme;
pub mod views;
pub mod widgets;
pub mod window;

pub use app::App;
pub use cli::{Args, StartupError};
pub use display::DisplayState;
pub use snowfall::Snowfall;
pub use views::{view_for, CardView, CompactView, Layout, SpecimenView};
pub use window::TerminalWindow;
