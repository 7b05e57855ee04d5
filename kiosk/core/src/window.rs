//! Window presentation
//!
//! The kiosk asks its window to maximize as soon as it starts and to go
//! fullscreen a short moment later. The window is an explicit
//! [`WindowHandle`] handed to the kiosk at startup; the core never reaches
//! for a global window.
//!
//! Window failures are logged at `warn` and otherwise ignored. They are
//! never retried and never hold up the display.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::scheduler::Scheduler;

/// Errors from a window backend
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    /// The surface can't perform this operation
    #[error("window operation not supported: {0}")]
    Unsupported(&'static str),

    /// Writing the request failed
    #[error("window request failed: {0}")]
    Io(#[from] std::io::Error),

    /// The windowing system refused the request
    #[error("window request rejected: {0}")]
    Rejected(String),
}

/// A window the kiosk can resize
pub trait WindowHandle: Send {
    /// Maximize the window
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be made.
    fn maximize(&mut self) -> Result<(), WindowError>;

    /// Enter or leave fullscreen
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be made.
    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), WindowError>;

    /// Name for logs
    fn name(&self) -> &str {
        "window"
    }
}

/// Timer keys owned by the fullscreen sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WindowTimer {
    /// Request fullscreen
    Fullscreen,
}

/// Maximize now, fullscreen after a delay
pub struct FullscreenSequence {
    window: Box<dyn WindowHandle>,
    timers: Scheduler<WindowTimer>,
    delay: Duration,
    maximized: bool,
    fullscreen_requested: bool,
}

impl std::fmt::Debug for FullscreenSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FullscreenSequence")
            .field("window", &self.window.name())
            .field("delay", &self.delay)
            .field("maximized", &self.maximized)
            .field("fullscreen_requested", &self.fullscreen_requested)
            .finish()
    }
}

impl FullscreenSequence {
    /// Wrap a window
    #[must_use]
    pub fn new(window: Box<dyn WindowHandle>, delay: Duration) -> Self {
        Self {
            window,
            timers: Scheduler::new(),
            delay,
            maximized: false,
            fullscreen_requested: false,
        }
    }

    /// Maximize and schedule the fullscreen request
    pub fn begin(&mut self, now: Instant) {
        match self.window.maximize() {
            Ok(()) => {
                self.maximized = true;
                tracing::debug!(window = self.window.name(), "window maximized");
            }
            Err(e) => {
                tracing::warn!(window = self.window.name(), error = %e, "maximize failed");
            }
        }
        self.timers.schedule(WindowTimer::Fullscreen, now + self.delay);
    }

    /// Issue the fullscreen request once it is due. Returns whether it fired.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut fired = false;
        for timer in self.timers.pop_due(now) {
            match timer {
                WindowTimer::Fullscreen => {
                    fired = true;
                    self.fullscreen_requested = true;
                    match self.window.set_fullscreen(true) {
                        Ok(()) => {
                            tracing::debug!(window = self.window.name(), "fullscreen requested");
                        }
                        Err(e) => {
                            tracing::warn!(window = self.window.name(), error = %e, "fullscreen failed");
                        }
                    }
                }
            }
        }
        fired
    }

    /// When the fullscreen request is due
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Whether maximize succeeded
    #[must_use]
    pub fn is_maximized(&self) -> bool {
        self.maximized
    }

    /// Whether the fullscreen request has been issued
    #[must_use]
    pub fn fullscreen_requested(&self) -> bool {
        self.fullscreen_requested
    }

    /// Drop the pending request
    pub fn cancel(&mut self) {
        self.timers.cancel_all();
    }
}

/// A request seen by a [`HeadlessWindow`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowCall {
    /// `maximize`
    Maximize,
    /// `set_fullscreen`
    Fullscreen(bool),
}

/// Window for headless runs: accepts and records every request
#[derive(Debug, Clone, Default)]
pub struct HeadlessWindow {
    calls: Arc<Mutex<Vec<WindowCall>>>,
    reject: bool,
}

impl HeadlessWindow {
    /// A window that accepts everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A window that records then rejects every request
    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            calls: Arc::default(),
            reject: true,
        }
    }

    /// Requests seen so far, shared across clones
    #[must_use]
    pub fn calls(&self) -> Vec<WindowCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: WindowCall) -> Result<(), WindowError> {
        self.calls.lock().push(call);
        if self.reject {
            Err(WindowError::Rejected(format!("{call:?}")))
        } else {
            Ok(())
        }
    }
}

impl WindowHandle for HeadlessWindow {
    fn maximize(&mut self) -> Result<(), WindowError> {
        self.record(WindowCall::Maximize)
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), WindowError> {
        self.record(WindowCall::Fullscreen(fullscreen))
    }

    fn name(&self) -> &str {
        "headless"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_maximize_then_fullscreen_after_delay() {
        let t0 = Instant::now();
        let window = HeadlessWindow::new();
        let mut sequence = FullscreenSequence::new(Box::new(window.clone()), ms(500));

        sequence.begin(t0);
        assert!(sequence.is_maximized());
        assert_eq!(window.calls(), vec![WindowCall::Maximize]);

        assert!(!sequence.poll(t0 + ms(499)));
        assert!(sequence.poll(t0 + ms(500)));
        assert!(sequence.fullscreen_requested());
        assert_eq!(
            window.calls(),
            vec![WindowCall::Maximize, WindowCall::Fullscreen(true)]
        );

        // Fires once
        assert!(!sequence.poll(t0 + ms(5000)));
        assert_eq!(sequence.next_deadline(), None);
    }

    #[test]
    fn test_failures_are_not_retried() {
        let t0 = Instant::now();
        let window = HeadlessWindow::rejecting();
        let mut sequence = FullscreenSequence::new(Box::new(window.clone()), ms(500));

        sequence.begin(t0);
        assert!(!sequence.is_maximized());
        assert!(sequence.poll(t0 + ms(500)));
        assert!(!sequence.poll(t0 + ms(1000)));
        assert_eq!(window.calls().len(), 2);
    }

    #[test]
    fn test_cancel_drops_pending_request() {
        let t0 = Instant::now();
        let window = HeadlessWindow::new();
        let mut sequence = FullscreenSequence::new(Box::new(window.clone()), ms(500));

        sequence.begin(t0);
        sequence.cancel();
        assert!(!sequence.poll(t0 + ms(500)));
        assert_eq!(window.calls(), vec![WindowCall::Maximize]);
    }
}
