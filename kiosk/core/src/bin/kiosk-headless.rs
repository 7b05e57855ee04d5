//! Kiosk Headless
//!
//! Runs the kiosk with no display: the catalog service reads scans from a
//! feed, the kiosk applies them, and every transition is logged. Useful for
//! exercising a scanner feed or a catalog without a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Feed tag ids on stdin
//! printf '1\n3\n' | KIOSK_CATALOG=tui/assets/fish_data.json kiosk-headless
//!
//! # Read from a FIFO written by the reader daemon
//! KIOSK_FEED=/run/polar-kiosk/scans kiosk-headless
//!
//! # With verbose logging
//! RUST_LOG=debug kiosk-headless
//! ```
//!
//! # Environment Variables
//!
//! - `KIOSK_CONFIG`: Config file path
//! - `KIOSK_DISPLAY_SECONDS`, `KIOSK_MAX_PARTICLES`, `KIOSK_CATALOG`,
//!   `KIOSK_FEED`, `KIOSK_FULLSCREEN`: Overrides (see `kiosk_core::config`)
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)
//!
//! # Signals
//!
//! - SIGINT: Graceful shutdown

use tokio::io::{AsyncBufRead, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

use kiosk_core::{
    load_config, BackendCommand, Catalog, CatalogService, ConfigOverrides, EventBus,
    HeadlessWindow, Kiosk, KioskConfig, KioskMessage, ScanFeed,
};

fn load_catalog(config: &KioskConfig) -> Catalog {
    let Some(path) = &config.scanner.catalog_path else {
        warn!("no catalog configured, scanned ids will not resolve");
        return Catalog::default();
    };
    match Catalog::load_from_path(path) {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!(error = %e, "catalog unavailable");
            Catalog::default()
        }
    }
}

async fn open_feed(config: &KioskConfig) -> Box<dyn AsyncBufRead + Send + Unpin> {
    if let Some(path) = &config.scanner.feed_path {
        match tokio::fs::File::open(path).await {
            Ok(file) => {
                info!(path = %path.display(), "reading scans from feed");
                return Box::new(BufReader::new(file));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "feed unavailable, falling back to stdin");
            }
        }
    }
    Box::new(BufReader::new(tokio::io::stdin()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kiosk_headless=info".parse()?)
                .add_directive("kiosk_core=info".parse()?),
        )
        .with_target(true)
        .init();

    info!("Starting kiosk (headless)");

    let (mut config, source) = load_config()?;
    config.apply(&ConfigOverrides::from_env());
    config.validate()?;
    info!(source = %source, "configuration loaded");

    let bus = EventBus::new();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<BackendCommand>();
    let (msg_tx, mut msg_rx) = mpsc::channel::<KioskMessage>(64);

    let service = CatalogService::new(load_catalog(&config), bus.clone(), &config.scanner.event);
    let feed = ScanFeed::new(open_feed(&config).await);
    let backend = tokio::spawn(service.run(cmd_rx, Some(feed)));

    let surface = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            match msg {
                KioskMessage::SpecimenShown {
                    scan_id,
                    specimen,
                    received_at,
                    replaced,
                } => info!(
                    %scan_id,
                    id = specimen.id,
                    name = %specimen.display_name(),
                    status = %specimen.conservation_status(),
                    at = %received_at.to_rfc3339(),
                    replaced,
                    "shown"
                ),
                KioskMessage::SpecimenCleared { specimen_id } => {
                    info!(id = specimen_id, "cleared");
                }
                KioskMessage::Notify { level, message } => {
                    warn!(?level, %message, "notice");
                }
            }
        }
    });

    let mut kiosk = Kiosk::new(config, bus.clone(), Some(cmd_tx), msg_tx);
    kiosk.start(Some(Box::new(HeadlessWindow::new())), Instant::now());

    kiosk
        .run_until(async {
            if let Err(e) = signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("Shutting down");
    bus.close();
    drop(kiosk);
    backend.abort();
    let _ = surface.await;

    Ok(())
}
