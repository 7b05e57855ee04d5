//! Scanner backend
//!
//! The kiosk talks to its scanner backend over two channels: specimens come
//! in as `fishData` notifications on the [`EventBus`], and the only request
//! going out is the fire-and-forget [`BackendCommand::DebugScanRandomFish`].
//!
//! [`CatalogService`] is the in-process backend. It owns the fish catalog,
//! turns scanned tag ids from a [`ScanFeed`] into notifications and answers
//! debug requests with a random catalog entry.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;

use crate::bus::{BusError, EventBus};
use crate::feed::{FeedError, ScanFeed, ScanLine};
use crate::specimen::Specimen;

/// Requests the kiosk can send to its backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendCommand {
    /// Emit a random catalog specimen as if it had been scanned
    DebugScanRandomFish,
}

impl BackendCommand {
    /// Wire name of [`BackendCommand::DebugScanRandomFish`]
    pub const DEBUG_SCAN_RANDOM_FISH: &'static str = "debug_scan_random_fish";

    /// Wire name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DebugScanRandomFish => Self::DEBUG_SCAN_RANDOM_FISH,
        }
    }

    /// Look up a command by wire name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            Self::DEBUG_SCAN_RANDOM_FISH => Some(Self::DebugScanRandomFish),
            _ => None,
        }
    }
}

/// Errors loading a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// File could not be read
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// Catalog path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid JSON
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Top level is not an array
    #[error("catalog must be a JSON array of specimens")]
    NotAnArray,
}

/// Errors serving a backend request
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No catalog entry for a scanned id
    #[error("no specimen with id {0}")]
    UnknownId(u32),

    /// Random pick from an empty catalog
    #[error("catalog is empty")]
    EmptyCatalog,

    /// Notification could not be emitted
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// The fish catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<Specimen>,
}

impl Catalog {
    /// Build from specimens
    #[must_use]
    pub fn new(entries: Vec<Specimen>) -> Self {
        Self { entries }
    }

    /// Parse a JSON array. Entries are decoded as leniently as scan payloads.
    ///
    /// # Errors
    ///
    /// Fails on invalid JSON or a non-array top level.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Array(items) = value else {
            return Err(CatalogError::NotAnArray);
        };
        Ok(Self::new(items.iter().map(Specimen::from_payload).collect()))
    }

    /// Load a catalog file
    ///
    /// # Errors
    ///
    /// Fails if the file can't be read or parsed.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), entries = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Entry with the given id
    #[must_use]
    pub fn find(&self, id: u32) -> Option<&Specimen> {
        self.entries.iter().find(|s| s.id == id)
    }

    /// Uniformly random entry
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Specimen> {
        self.entries.choose(rng)
    }

    /// All entries
    #[must_use]
    pub fn entries(&self) -> &[Specimen] {
        &self.entries
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// In-process scanner backend
#[derive(Debug)]
pub struct CatalogService {
    catalog: Catalog,
    bus: EventBus,
    event: String,
    rng: StdRng,
    published: u64,
}

impl CatalogService {
    /// Create a service emitting on `event`
    #[must_use]
    pub fn new(catalog: Catalog, bus: EventBus, event: impl Into<String>) -> Self {
        Self {
            catalog,
            bus,
            event: event.into(),
            rng: StdRng::from_entropy(),
            published: 0,
        }
    }

    /// Use a deterministic RNG for random picks
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Emit the catalog entry for a scanned tag id.
    ///
    /// Returns how many listeners received it.
    ///
    /// # Errors
    ///
    /// [`BackendError::UnknownId`] when the id isn't in the catalog.
    pub fn publish(&mut self, id: u32) -> Result<usize, BackendError> {
        let specimen = self.catalog.find(id).ok_or(BackendError::UnknownId(id))?;
        let delivered = self.bus.emit_json(&self.event, specimen)?;
        tracing::info!(id, name = %specimen.display_name(), delivered, "scan published");
        self.published += 1;
        Ok(delivered)
    }

    /// Emit a random catalog entry
    ///
    /// # Errors
    ///
    /// [`BackendError::EmptyCatalog`] when there is nothing to pick.
    pub fn publish_random(&mut self) -> Result<usize, BackendError> {
        let specimen = self
            .catalog
            .random(&mut self.rng)
            .ok_or(BackendError::EmptyCatalog)?;
        let delivered = self.bus.emit_json(&self.event, specimen)?;
        tracing::info!(
            id = specimen.id,
            name = %specimen.display_name(),
            delivered,
            "random scan published"
        );
        self.published += 1;
        Ok(delivered)
    }

    /// Emit a raw payload unchanged
    pub fn forward(&mut self, payload: Value) -> usize {
        self.published += 1;
        self.bus.emit(&self.event, payload)
    }

    /// Serve one command
    ///
    /// # Errors
    ///
    /// Propagates the publish failure.
    pub fn handle_command(&mut self, command: BackendCommand) -> Result<usize, BackendError> {
        tracing::debug!(command = command.name(), "backend command");
        match command {
            BackendCommand::DebugScanRandomFish => self.publish_random(),
        }
    }

    /// Serve one feed line
    ///
    /// # Errors
    ///
    /// Propagates the publish failure for tag ids.
    pub fn handle_scan(&mut self, scan: ScanLine) -> Result<usize, BackendError> {
        match scan {
            ScanLine::Tag(id) => self.publish(id),
            ScanLine::Payload(payload) => Ok(self.forward(payload)),
            ScanLine::Blank => Ok(0),
        }
    }

    /// Serve commands and an optional scan feed until both are exhausted.
    ///
    /// Every failure is logged and the loop carries on; a failed feed is
    /// not reopened.
    pub async fn run<R>(
        mut self,
        mut commands: mpsc::UnboundedReceiver<BackendCommand>,
        mut feed: Option<ScanFeed<R>>,
    ) where
        R: AsyncBufRead + Unpin,
    {
        let mut commands_open = true;
        let mut feed_open = feed.is_some();

        tracing::info!(entries = self.catalog.len(), event = %self.event, "catalog service started");

        while commands_open || feed_open {
            tokio::select! {
                command = commands.recv(), if commands_open => {
                    match command {
                        Some(command) => {
                            if let Err(e) = self.handle_command(command) {
                                tracing::warn!(command = command.name(), error = %e, "backend command failed");
                            }
                        }
                        None => {
                            tracing::debug!("command channel closed");
                            commands_open = false;
                        }
                    }
                }
                scan = next_scan(&mut feed), if feed_open => {
                    match scan {
                        Ok(Some(scan)) => {
                            if let Err(e) = self.handle_scan(scan) {
                                tracing::warn!(error = %e, "scan not published");
                            }
                        }
                        Ok(None) => {
                            tracing::info!("scan feed ended");
                            feed_open = false;
                        }
                        Err(FeedError::Unrecognised(line)) => {
                            tracing::warn!(line = %line, "skipping unrecognised scan line");
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "scan feed failed");
                            feed_open = false;
                        }
                    }
                }
            }
        }

        tracing::info!(published = self.published, "catalog service stopped");
    }

    /// Notifications emitted so far
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published
    }

    /// The catalog
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

async fn next_scan<R: AsyncBufRead + Unpin>(
    feed: &mut Option<ScanFeed<R>>,
) -> Result<Option<ScanLine>, FeedError> {
    match feed {
        Some(feed) => feed.next_scan().await,
        None => Ok(None),
    }
}
