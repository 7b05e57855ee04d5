//! Scan Display Controller
//!
//! Owns the specimen currently on screen and the single timer that sends the
//! display back to its idle welcome view.
//!
//! ```text
//! Idle    --(scan)-->    Showing
//! Showing --(scan)-->    Showing   [specimen replaced, expiry restarted]
//! Showing --(expiry)-->  Idle
//! ```
//!
//! The expiry lives in a [`Scheduler`] under one key. A new scan reschedules
//! that key, which replaces the old deadline, so an expiry belonging to an
//! earlier specimen can never clear a newer one.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::backend::BackendCommand;
use crate::scheduler::Scheduler;
use crate::specimen::Specimen;

/// Timer keys owned by the controller
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisplayTimer {
    /// Return to idle
    Expiry,
}

/// What the display is showing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DisplayState {
    /// Welcome view, no specimen
    #[default]
    Idle,
    /// A specimen is on screen until `expires_at`
    Showing {
        /// The specimen being shown
        specimen: Specimen,
        /// When the display reverts to idle
        expires_at: Instant,
    },
}

impl DisplayState {
    /// Whether nothing is shown
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The specimen on screen, if any
    #[must_use]
    pub fn specimen(&self) -> Option<&Specimen> {
        match self {
            Self::Idle => None,
            Self::Showing { specimen, .. } => Some(specimen),
        }
    }

    /// Short label for logs and status lines
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Showing { .. } => "showing",
        }
    }
}

/// Manual key that asks the backend for a random specimen
#[derive(Debug, Clone)]
pub struct DebugTrigger {
    key: char,
    commands: mpsc::UnboundedSender<BackendCommand>,
}

impl DebugTrigger {
    /// Bind `key` to the debug scan command
    #[must_use]
    pub fn new(key: char, commands: mpsc::UnboundedSender<BackendCommand>) -> Self {
        Self { key, commands }
    }

    /// The configured key
    #[must_use]
    pub fn key(&self) -> char {
        self.key
    }

    /// Case-insensitive key match
    #[must_use]
    pub fn matches(&self, key: char) -> bool {
        self.key.to_lowercase().eq(key.to_lowercase())
    }
}

/// The scan-to-display state machine
#[derive(Debug)]
pub struct ScanDisplayController {
    state: DisplayState,
    timers: Scheduler<DisplayTimer>,
    display_duration: Duration,
    debug: Option<DebugTrigger>,
    scans_received: u64,
}

impl ScanDisplayController {
    /// Create an idle controller
    #[must_use]
    pub fn new(display_duration: Duration) -> Self {
        Self {
            state: DisplayState::Idle,
            timers: Scheduler::new(),
            display_duration,
            debug: None,
            scans_received: 0,
        }
    }

    /// Enable the debug path
    #[must_use]
    pub fn with_debug_trigger(mut self, trigger: DebugTrigger) -> Self {
        self.debug = Some(trigger);
        self
    }

    /// Show `specimen`, replacing whatever is on screen, and restart the expiry.
    ///
    /// Returns the specimen that was replaced, if any.
    pub fn on_scan_received(&mut self, specimen: Specimen, now: Instant) -> Option<Specimen> {
        let expires_at = now + self.display_duration;
        self.timers.schedule(DisplayTimer::Expiry, expires_at);
        self.scans_received += 1;

        tracing::info!(
            id = specimen.id,
            name = %specimen.display_name(),
            display_ms = self.display_duration.as_millis() as u64,
            "showing specimen"
        );

        let previous = std::mem::replace(
            &mut self.state,
            DisplayState::Showing {
                specimen,
                expires_at,
            },
        );

        match previous {
            DisplayState::Showing { specimen, .. } => Some(specimen),
            DisplayState::Idle => None,
        }
    }

    /// Fire the expiry if its deadline has passed.
    ///
    /// Returns the specimen that was cleared.
    pub fn poll_expired(&mut self, now: Instant) -> Option<Specimen> {
        let mut cleared = None;
        for timer in self.timers.pop_due(now) {
            match timer {
                DisplayTimer::Expiry => cleared = self.on_expiry(),
            }
        }
        cleared
    }

    fn on_expiry(&mut self) -> Option<Specimen> {
        match std::mem::take(&mut self.state) {
            DisplayState::Showing { specimen, .. } => {
                tracing::debug!(id = specimen.id, "display expired, back to idle");
                Some(specimen)
            }
            DisplayState::Idle => None,
        }
    }

    /// Ask the backend for a random specimen.
    ///
    /// Fire-and-forget: the specimen arrives later through the notification
    /// channel. Returns whether a request was dispatched.
    pub fn on_debug_trigger(&self) -> bool {
        let Some(debug) = &self.debug else {
            return false;
        };

        let command = BackendCommand::DebugScanRandomFish;
        match debug.commands.send(command) {
            Ok(()) => {
                tracing::debug!(command = command.name(), "debug scan requested");
                true
            }
            Err(_) => {
                tracing::warn!(command = command.name(), "backend is gone, debug scan ignored");
                false
            }
        }
    }

    /// Route a key press: dispatches the debug request when it matches.
    pub fn handle_key(&self, key: char) -> bool {
        match &self.debug {
            Some(debug) if debug.matches(key) => self.on_debug_trigger(),
            _ => false,
        }
    }

    /// Read accessor for the presentation layer
    #[must_use]
    pub fn current_specimen(&self) -> Option<&Specimen> {
        self.state.specimen()
    }

    /// Full display state
    #[must_use]
    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// When the pending expiry fires
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Number of pending expiry timers (0 or 1)
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// How long a specimen stays on screen
    #[must_use]
    pub fn display_duration(&self) -> Duration {
        self.display_duration
    }

    /// The configured debug key
    #[must_use]
    pub fn debug_key(&self) -> Option<char> {
        self.debug.as_ref().map(DebugTrigger::key)
    }

    /// Total scans accepted
    #[must_use]
    pub fn scans_received(&self) -> u64 {
        self.scans_received
    }

    /// Cancel the pending expiry. The current state is kept for the final frame.
    pub fn shutdown(&mut self) {
        self.timers.cancel_all();
    }
}
