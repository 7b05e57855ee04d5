//! Display State Types
//!
//! What the terminal surface remembers between frames. It is derived from
//! `KioskMessage`s and only drives presentation: the pop-in animation of a
//! freshly scanned specimen, the status-bar notice and the last-scan clock.
//!
//! The specimen itself is always read from the kiosk at render time, so this
//! state can never disagree with the controller about what is on screen.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local, Utc};
use kiosk_core::{KioskMessage, NotifyLevel, ScanId};

/// How long the card takes to pop in
pub const POP_IN: Duration = Duration::from_millis(400);

/// How long a notice stays in the status bar
pub const NOTICE_TTL: Duration = Duration::from_secs(8);

/// A status-bar notice
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayNotification {
    /// Severity
    pub level: NotifyLevel,
    /// Text
    pub message: String,
    /// When it arrived
    pub since: Instant,
}

/// Surface-side state for the current scan
#[derive(Clone, Debug, PartialEq)]
pub struct ShownScan {
    /// Scan that produced the specimen
    pub scan_id: ScanId,
    /// Catalog id
    pub specimen_id: u32,
    /// When the surface learned of it
    pub shown_at: Instant,
}

/// The full display state for the terminal surface
#[derive(Debug, Default)]
pub struct DisplayState {
    /// Current scan, if a specimen is showing
    pub current: Option<ShownScan>,
    /// Latest notice
    pub notification: Option<DisplayNotification>,
    /// Wall-clock time of the last accepted scan
    pub last_scan_at: Option<DateTime<Utc>>,
    /// Scans seen this session
    pub scans_seen: u64,
}

impl DisplayState {
    /// Create an empty display state
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a message from the kiosk
    pub fn apply_message(&mut self, msg: KioskMessage, now: Instant) {
        match msg {
            KioskMessage::SpecimenShown {
                scan_id,
                specimen,
                received_at,
                ..
            } => {
                self.current = Some(ShownScan {
                    scan_id,
                    specimen_id: specimen.id,
                    shown_at: now,
                });
                self.last_scan_at = Some(received_at);
                self.scans_seen += 1;
            }
            KioskMessage::SpecimenCleared { specimen_id } => {
                // A newer scan may already have replaced it
                if self
                    .current
                    .as_ref()
                    .is_some_and(|shown| shown.specimen_id == specimen_id)
                {
                    self.current = None;
                }
            }
            KioskMessage::Notify { level, message } => {
                self.notification = Some(DisplayNotification {
                    level,
                    message,
                    since: now,
                });
            }
        }
    }

    /// Drop notices that have been up long enough
    pub fn update(&mut self, now: Instant) {
        if self
            .notification
            .as_ref()
            .is_some_and(|n| now.saturating_duration_since(n.since) >= NOTICE_TTL)
        {
            self.notification = None;
        }
    }

    /// Pop-in progress of the current card, 0.0 to 1.0 (1.0 when idle)
    pub fn pop_in(&self, now: Instant) -> f32 {
        match &self.current {
            Some(shown) => {
                let elapsed = now.saturating_duration_since(shown.shown_at);
                (elapsed.as_secs_f32() / POP_IN.as_secs_f32()).min(1.0)
            }
            None => 1.0,
        }
    }

    /// Last-scan clock for the status bar, in local time
    pub fn last_scan_label(&self) -> Option<String> {
        self.last_scan_at
            .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_core::Specimen;
    use pretty_assertions::assert_eq;

    fn shown(id: u32) -> KioskMessage {
        KioskMessage::SpecimenShown {
            scan_id: ScanId::new(),
            specimen: Specimen {
                id,
                ..Default::default()
            },
            received_at: Utc::now(),
            replaced: false,
        }
    }

    #[test]
    fn test_shown_then_cleared() {
        let now = Instant::now();
        let mut display = DisplayState::new();

        display.apply_message(shown(3), now);
        assert_eq!(display.current.as_ref().map(|s| s.specimen_id), Some(3));
        assert_eq!(display.scans_seen, 1);
        assert!(display.last_scan_label().is_some());

        display.apply_message(KioskMessage::SpecimenCleared { specimen_id: 3 }, now);
        assert_eq!(display.current, None);
    }

    #[test]
    fn test_stale_clear_is_ignored() {
        let now = Instant::now();
        let mut display = DisplayState::new();

        display.apply_message(shown(1), now);
        display.apply_message(shown(2), now);
        display.apply_message(KioskMessage::SpecimenCleared { specimen_id: 1 }, now);

        assert_eq!(display.current.as_ref().map(|s| s.specimen_id), Some(2));
    }

    #[test]
    fn test_pop_in_progress() {
        let now = Instant::now();
        let mut display = DisplayState::new();
        assert_eq!(display.pop_in(now), 1.0);

        display.apply_message(shown(1), now);
        assert_eq!(display.pop_in(now), 0.0);
        assert_eq!(display.pop_in(now + POP_IN / 2), 0.5);
        assert_eq!(display.pop_in(now + POP_IN * 3), 1.0);
    }

    #[test]
    fn test_notification_expires() {
        let now = Instant::now();
        let mut display = DisplayState::new();
        display.apply_message(
            KioskMessage::notify(NotifyLevel::Warning, "scanner disconnected"),
            now,
        );

        display.update(now + Duration::from_secs(1));
        assert!(display.notification.is_some());

        display.update(now + NOTICE_TTL);
        assert!(display.notification.is_none());
    }
}
