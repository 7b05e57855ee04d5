//! The Kiosk
//!
//! Composes the scan display controller, the snowfall generator, the
//! notification subscription and the fullscreen sequence into one headless
//! unit that any surface can drive.
//!
//! # Driving the kiosk
//!
//! Surfaces either call [`Kiosk::turn`] from their own `select!` loop, or hand
//! control to [`Kiosk::run_until`]. Both are single-threaded: every state
//! change happens synchronously after a wake-up, so there is nothing to lock.
//!
//! ```ignore
//! let (tx, mut rx) = mpsc::channel(64);
//! let mut kiosk = Kiosk::new(config, bus, Some(commands), tx);
//! kiosk.start(Some(Box::new(window)), Instant::now());
//!
//! loop {
//!     tokio::select! {
//!         _ = kiosk.turn() => {}
//!         Some(event) = input.next() => kiosk.handle_event(event, Instant::now()),
//!     }
//!     while let Ok(msg) = rx.try_recv() {
//!         // Render
//!     }
//! }
//! ```

use std::future::Future;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::backend::BackendCommand;
use crate::bus::{EventBus, Subscription};
use crate::config::KioskConfig;
use crate::controller::{DebugTrigger, DisplayState, ScanDisplayController};
use crate::events::SurfaceEvent;
use crate::messages::{KioskMessage, NotifyLevel, ScanId};
use crate::particles::{Particle, ParticleGenerator, ParticleUpdate};
use crate::specimen::Specimen;
use crate::window::{FullscreenSequence, WindowHandle};

/// Lifecycle of the kiosk itself
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KioskState {
    /// Built, not started
    Created,
    /// Listening and animating
    Running,
    /// Torn down; nothing more will happen
    Stopped,
}

/// What one [`Kiosk::poll`] did
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PollOutcome {
    /// Specimen cleared by the display expiry
    pub cleared: Option<Specimen>,
    /// Snowfall changes
    pub particles: ParticleUpdate,
    /// Whether the fullscreen request went out
    pub fullscreen_requested: bool,
}

impl PollOutcome {
    /// Whether nothing happened
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cleared.is_none() && self.particles.is_empty() && !self.fullscreen_requested
    }
}

/// Why [`Kiosk::turn`] returned
#[derive(Debug, Clone, PartialEq)]
pub enum Wake {
    /// A notification payload was applied
    Payload,
    /// One or more deadlines were due
    Timers(PollOutcome),
    /// The notification subscription ended
    SubscriptionClosed,
}

/// Headless kiosk
#[derive(Debug)]
pub struct Kiosk {
    config: KioskConfig,
    bus: EventBus,
    controller: ScanDisplayController,
    particles: ParticleGenerator,
    window: Option<FullscreenSequence>,
    subscription: Option<Subscription>,
    tx: mpsc::Sender<KioskMessage>,
    state: KioskState,
}

impl Kiosk {
    /// Build a kiosk from configuration.
    ///
    /// The debug scan key is active only when `display.debug_key` is set and
    /// a command sender is supplied.
    #[must_use]
    pub fn new(
        config: KioskConfig,
        bus: EventBus,
        commands: Option<mpsc::UnboundedSender<BackendCommand>>,
        tx: mpsc::Sender<KioskMessage>,
    ) -> Self {
        let mut controller = ScanDisplayController::new(config.display.display_duration());
        if let (Some(key), Some(commands)) = (config.display.debug_key, commands) {
            controller = controller.with_debug_trigger(DebugTrigger::new(key, commands));
        }
        let particles = ParticleGenerator::new(config.particles.clone());

        Self {
            config,
            bus,
            controller,
            particles,
            window: None,
            subscription: None,
            tx,
            state: KioskState::Created,
        }
    }

    /// Replace the snowfall generator (deterministic seeds in tests)
    #[must_use]
    pub fn with_particles(mut self, particles: ParticleGenerator) -> Self {
        self.particles = particles;
        self
    }

    /// Subscribe, start the window sequence and arm the snowfall.
    ///
    /// A failed subscription is logged and reported to the surface; the
    /// kiosk still runs, showing the idle view.
    pub fn start(&mut self, window: Option<Box<dyn WindowHandle>>, now: Instant) {
        if self.state != KioskState::Created {
            tracing::debug!(state = ?self.state, "start ignored");
            return;
        }
        self.state = KioskState::Running;

        let event = self.config.scanner.event.clone();
        match self.bus.subscribe(&event) {
            Ok(subscription) => {
                tracing::info!(event = %event, subscription = %subscription.id(), "listening for scans");
                self.subscription = Some(subscription);
            }
            Err(e) => {
                tracing::warn!(event = %event, error = %e, "scan subscription failed");
                self.send(KioskMessage::notify(
                    NotifyLevel::Warning,
                    format!("scanner unavailable: {e}"),
                ));
            }
        }

        if let Some(window) = window {
            if self.config.window.fullscreen_on_start {
                let mut sequence =
                    FullscreenSequence::new(window, self.config.window.fullscreen_delay());
                sequence.begin(now);
                self.window = Some(sequence);
            }
        }

        self.particles.start(now);

        tracing::info!(
            display_secs = self.config.display.display_duration_secs,
            max_particles = self.config.particles.max_particles,
            debug_key = ?self.controller.debug_key(),
            "kiosk started"
        );
    }

    /// Apply a surface event
    pub fn handle_event(&mut self, event: SurfaceEvent, now: Instant) {
        if self.state != KioskState::Running {
            tracing::trace!(kind = event.kind(), "event ignored, kiosk not running");
            return;
        }

        match event {
            SurfaceEvent::KeyPressed { key } => {
                self.controller.handle_key(key);
            }
            SurfaceEvent::Resized { width, height } => {
                tracing::debug!(width, height, "surface resized");
            }
            SurfaceEvent::QuitRequested => {
                tracing::info!("quit requested");
                self.shutdown();
            }
        }

        // Keep timers honest if the surface is slow to turn
        self.poll(now);
    }

    /// Decode a notification payload and show it
    pub fn handle_payload(&mut self, payload: Value, now: Instant) {
        if self.state != KioskState::Running {
            tracing::trace!("payload ignored, kiosk not running");
            return;
        }

        let specimen = Specimen::from_payload(&payload);
        let replaced = self.controller.on_scan_received(specimen.clone(), now).is_some();

        self.send(KioskMessage::SpecimenShown {
            scan_id: ScanId::new(),
            specimen,
            received_at: chrono::Utc::now(),
            replaced,
        });
    }

    /// Run every deadline that is due at `now`
    pub fn poll(&mut self, now: Instant) -> PollOutcome {
        if self.state != KioskState::Running {
            return PollOutcome::default();
        }

        let cleared = self.controller.poll_expired(now);
        if let Some(specimen) = &cleared {
            self.send(KioskMessage::SpecimenCleared {
                specimen_id: specimen.id,
            });
        }

        let particles = self.particles.poll(now);
        let fullscreen_requested = self
            .window
            .as_mut()
            .is_some_and(|window| window.poll(now));

        PollOutcome {
            cleared,
            particles,
            fullscreen_requested,
        }
    }

    /// Earliest pending deadline across every component
    #[must_use]
    pub fn next_wakeup(&self) -> Option<Instant> {
        [
            self.controller.next_deadline(),
            self.particles.next_deadline(),
            self.window.as_ref().and_then(FullscreenSequence::next_deadline),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Wait for the next payload or deadline and apply it.
    ///
    /// Cancel safe: nothing is mutated until the wait completes, so this can
    /// sit in a surface's `select!` next to input and frame ticks. Pends
    /// forever once there is nothing left to wait for.
    pub async fn turn(&mut self) -> Wake {
        let wakeup = self.next_wakeup();

        let received = tokio::select! {
            payload = next_payload(self.subscription.as_mut()) => Some(payload),
            () = sleep_until(wakeup) => None,
        };

        let now = Instant::now();
        match received {
            Some(Some(payload)) => {
                self.handle_payload(payload, now);
                self.poll(now);
                Wake::Payload
            }
            Some(None) => {
                tracing::warn!("scan subscription ended");
                self.subscription = None;
                self.send(KioskMessage::notify(
                    NotifyLevel::Warning,
                    "scanner disconnected",
                ));
                Wake::SubscriptionClosed
            }
            None => Wake::Timers(self.poll(now)),
        }
    }

    /// Run headless until `shutdown` resolves or the kiosk stops itself
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        while self.state == KioskState::Running {
            tokio::select! {
                () = &mut shutdown => break,
                _ = self.turn() => {}
            }
        }

        self.shutdown();
    }

    /// Tear down: drop the subscription and cancel every timer. Idempotent.
    pub fn shutdown(&mut self) {
        if self.state == KioskState::Stopped {
            return;
        }

        self.subscription = None;
        self.controller.shutdown();
        self.particles.shutdown();
        if let Some(window) = &mut self.window {
            window.cancel();
        }
        self.state = KioskState::Stopped;

        tracing::info!(
            scans = self.controller.scans_received(),
            particles_spawned = self.particles.spawned_total(),
            "kiosk stopped"
        );
    }

    fn send(&self, msg: KioskMessage) {
        if let Err(e) = self.tx.try_send(msg) {
            tracing::warn!(error = %e, "failed to send message to surface");
        }
    }

    /// Specimen on screen, if any
    #[must_use]
    pub fn current_specimen(&self) -> Option<&Specimen> {
        self.controller.current_specimen()
    }

    /// Display state
    #[must_use]
    pub fn display_state(&self) -> &DisplayState {
        self.controller.state()
    }

    /// Active snowfall particles
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        self.particles.particles()
    }

    /// The snowfall generator
    #[must_use]
    pub fn particle_generator(&self) -> &ParticleGenerator {
        &self.particles
    }

    /// The display controller
    #[must_use]
    pub fn controller(&self) -> &ScanDisplayController {
        &self.controller
    }

    /// Kiosk lifecycle state
    #[must_use]
    pub fn state(&self) -> KioskState {
        self.state
    }

    /// Whether the kiosk is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == KioskState::Running
    }

    /// Whether the scan subscription is live
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.subscription.is_some()
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &KioskConfig {
        &self.config
    }
}

impl Drop for Kiosk {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn next_payload(subscription: Option<&mut Subscription>) -> Option<Value> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
