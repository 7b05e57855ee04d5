//! Kiosk Core - Headless Scan-to-Display Lifecycle for the Polar Fish Kiosk
//!
//! This crate holds everything the kiosk does that isn't drawing: deciding
//! which specimen is on screen and for how long, generating the ambient
//! snowfall, asking the window to go fullscreen, and talking to the scanner
//! backend. It can drive a terminal surface or run headless.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Surfaces                              │
//! │     ┌─────────────┐                  ┌──────────────────┐    │
//! │     │     TUI     │                  │  kiosk-headless  │    │
//! │     │  (ratatui)  │                  │    (logs only)   │    │
//! │     └──────┬──────┘                  └────────┬─────────┘    │
//! │            └──────────────┬───────────────────┘              │
//! │                  SurfaceEvent (up)                           │
//! │                  KioskMessage (down)                         │
//! └───────────────────────────┼──────────────────────────────────┘
//!                             │
//! ┌───────────────────────────┼──────────────────────────────────┐
//! │                       KIOSK CORE                             │
//! │  ┌────────────────────────┴───────────────────────────────┐  │
//! │  │                        Kiosk                           │  │
//! │  │  ┌────────────┐  ┌───────────┐  ┌──────────────────┐   │  │
//! │  │  │  Display   │  │ Particle  │  │    Fullscreen    │   │  │
//! │  │  │ Controller │  │ Generator │  │     Sequence     │   │  │
//! │  │  └─────▲──────┘  └───────────┘  └──────────────────┘   │  │
//! │  └────────┼───────────────────────────────────────────────┘  │
//! │           │ "fishData"                                       │
//! │  ┌────────┴───────┐   DebugScanRandomFish  ┌──────────────┐  │
//! │  │    EventBus    │◄───────────────────────│CatalogService│  │
//! │  └────────────────┘                        └──────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Kiosk`]: Composes every component and owns the event loop step
//! - [`ScanDisplayController`]: The Idle/Showing state machine
//! - [`ParticleGenerator`]: Bounded snowfall with per-particle removal
//! - [`EventBus`]: Named-event notifications with scoped subscriptions
//! - [`CatalogService`]: In-process scanner backend
//! - [`Scheduler`]: Keyed, cancellable deadlines shared by all of the above
//!
//! # Module Overview
//!
//! - [`backend`]: Backend commands, fish catalog, catalog service
//! - [`bus`]: Notification bus
//! - [`config`]: TOML configuration with environment overrides
//! - [`controller`]: Scan display controller
//! - [`events`]: Events from surfaces to the kiosk
//! - [`feed`]: Newline-delimited scan feed
//! - [`kiosk`]: The orchestrator
//! - [`messages`]: Messages from the kiosk to surfaces
//! - [`particles`]: Ambient particle generator
//! - [`scheduler`]: Keyed deadline scheduler
//! - [`specimen`]: Specimen records
//! - [`window`]: Window presentation
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod bus;
pub mod config;
pub mod controller;
pub mod events;
pub mod feed;
pub mod kiosk;
pub mod messages;
pub mod particles;
pub mod scheduler;
pub mod specimen;
pub mod window;

// Re-exports for convenience
pub use backend::{BackendCommand, BackendError, Catalog, CatalogError, CatalogService};
pub use bus::{BusError, EventBus, Subscription, SubscriptionId};
pub use config::{
    default_config_path, load_config, load_config_from, ConfigError, ConfigOverrides,
    ConfigSource, DisplayConfig, KioskConfig, ScannerConfig, WindowConfig, MAX_DISPLAY_SECS,
    MAX_INTERVAL_MS,
};
pub use controller::{DebugTrigger, DisplayState, DisplayTimer, ScanDisplayController};
pub use events::SurfaceEvent;
pub use feed::{FeedError, ScanFeed, ScanLine};
pub use kiosk::{Kiosk, KioskState, PollOutcome, Wake};
pub use messages::{KioskMessage, NotifyLevel, ScanId};
pub use particles::{
    Particle, ParticleConfig, ParticleGenerator, ParticleId, ParticleUpdate, ValueRange,
    MAX_PARTICLE_SECS,
};
pub use scheduler::Scheduler;
pub use specimen::{ConservationStatus, Specimen, FISH_DATA_EVENT};
pub use window::{
    FullscreenSequence, HeadlessWindow, WindowCall, WindowError, WindowHandle, WindowTimer,
};
