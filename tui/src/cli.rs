//! Command Line
//!
//! Flags override the environment, which overrides the config file.

use std::path::PathBuf;

use clap::Parser;
use kiosk_core::{load_config_from, ConfigError, ConfigOverrides, ConfigSource, KioskConfig};
use thiserror::Error;

use crate::views::Layout;

/// Polar fish kiosk display
#[derive(Debug, Parser)]
#[command(name = "polar-kiosk", version, about)]
pub struct Args {
    /// Config file (default: the platform config dir)
    #[arg(long, env = "KIOSK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Seconds a scanned specimen stays on screen
    #[arg(long, value_name = "SECONDS")]
    pub display_seconds: Option<f64>,

    /// Key that requests a random specimen
    #[arg(long, value_name = "CHAR")]
    pub debug_key: Option<char>,

    /// Catalog JSON file
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Scanner feed (file or FIFO)
    #[arg(long, value_name = "PATH")]
    pub feed: Option<PathBuf>,

    /// Stay windowed
    #[arg(long)]
    pub no_fullscreen: bool,

    /// Specimen layout
    #[arg(long, value_enum, default_value_t = Layout::Card)]
    pub layout: Layout,

    /// Write logs here instead of discarding them
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Reasons the display can't start
#[derive(Debug, Error)]
pub enum StartupError {
    /// Config file unreadable, malformed or out of range after overrides
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// stdin or stdout is not a TTY
    #[error("polar-kiosk requires a terminal (TTY); for a display-less run, use kiosk-headless")]
    NotATerminal,
}

impl Args {
    /// Load the config file, layer `env` and then the flags on top, and
    /// validate the result
    ///
    /// # Errors
    ///
    /// [`StartupError::Config`] if the file can't be loaded or the merged
    /// values are out of range.
    pub fn resolve_config(
        &self,
        env: ConfigOverrides,
    ) -> Result<(KioskConfig, ConfigSource), StartupError> {
        let (mut config, source) = load_config_from(self.config.as_deref())?;
        config.apply(&self.merged_overrides(env));
        config.validate()?;
        Ok((config, source))
    }

    /// Overrides given on the command line
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            display_duration_secs: self.display_seconds,
            debug_key: self.debug_key,
            max_particles: None,
            catalog_path: self.catalog.clone(),
            feed_path: self.feed.clone(),
            fullscreen_on_start: self.no_fullscreen.then_some(false),
        }
    }

    /// Environment overrides with the command line on top
    pub fn merged_overrides(&self, env: ConfigOverrides) -> ConfigOverrides {
        env.merge(self.overrides())
    }
}
