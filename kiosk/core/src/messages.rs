//! Kiosk Messages
//!
//! Messages sent from the kiosk to its display surface. The surface renders
//! what it is told and keeps no lifecycle logic of its own: the authoritative
//! state stays in the controller, these messages just let a surface react
//! (animate a pop-in, show a status line) without polling.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::specimen::Specimen;

/// Identifier for one accepted scan
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanId(pub Uuid);

impl ScanId {
    /// Generate a new random scan id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan_{}", self.0.simple())
    }
}

/// Severity of a surface notification
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    #[default]
    Info,
    /// Something degraded but the kiosk carries on
    Warning,
    /// Something failed
    Error,
}

/// Messages from the kiosk to a surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum KioskMessage {
    /// A specimen is now on screen
    SpecimenShown {
        /// Scan that produced it
        scan_id: ScanId,
        /// The specimen
        specimen: Specimen,
        /// Wall-clock time the scan was accepted
        received_at: DateTime<Utc>,
        /// Whether it replaced another specimen
        replaced: bool,
    },

    /// The display went back to idle
    SpecimenCleared {
        /// Id of the specimen that was cleared
        specimen_id: u32,
    },

    /// Status line text
    Notify {
        /// Severity
        level: NotifyLevel,
        /// Text to show
        message: String,
    },
}

impl KioskMessage {
    /// Build a notification
    pub fn notify(level: NotifyLevel, message: impl Into<String>) -> Self {
        Self::Notify {
            level,
            message: message.into(),
        }
    }
}
