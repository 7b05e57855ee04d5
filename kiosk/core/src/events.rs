//! Surface Events
//!
//! Events sent from a display surface to the kiosk. Surfaces only report what
//! happened (a key was pressed, the viewport changed); the kiosk decides what
//! it means.

use serde::{Deserialize, Serialize};

/// Events from a surface to the kiosk
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// A character key was pressed
    KeyPressed {
        /// The character, as typed
        key: char,
    },

    /// The surface viewport changed size
    Resized {
        /// New width (surface units)
        width: u32,
        /// New height (surface units)
        height: u32,
    },

    /// The operator asked to quit
    QuitRequested,
}

impl SurfaceEvent {
    /// Short name for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::KeyPressed { .. } => "key_pressed",
            Self::Resized { .. } => "resized",
            Self::QuitRequested => "quit_requested",
        }
    }
}
