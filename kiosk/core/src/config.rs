//! Kiosk Configuration
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`KIOSK_CONFIG`, else `$XDG_CONFIG_HOME/polar-kiosk/kiosk.toml`)
//! 3. Overrides from environment variables or the command line
//!
//! Unparsable override values are ignored and the lower layer is kept.
//! A config file that exists but can't be parsed is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::particles::{ParticleConfig, ValueRange, MAX_PARTICLE_SECS};
use crate::specimen::FISH_DATA_EVENT;

/// Errors loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Loaded from this file
    File(PathBuf),
    /// No file found; built-in defaults
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Longest a specimen may stay on screen, in seconds
pub const MAX_DISPLAY_SECS: f64 = 86_400.0;

/// Longest configurable interval, delay or buffer, in milliseconds
pub const MAX_INTERVAL_MS: u64 = 3_600_000;

/// Specimen display settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// How long a scanned specimen stays on screen
    pub display_duration_secs: f64,
    /// Key that requests a random debug scan; `None` disables it
    pub debug_key: Option<char>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            display_duration_secs: 10.0,
            debug_key: None,
        }
    }
}

impl DisplayConfig {
    /// Display duration as a `Duration`, clamped to `0..=MAX_DISPLAY_SECS`
    #[must_use]
    pub fn display_duration(&self) -> Duration {
        // Validated configs are already in range; NaN reads as zero
        Duration::from_secs_f64(self.display_duration_secs.max(0.0).min(MAX_DISPLAY_SECS))
    }
}

/// Window settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Maximize and go fullscreen at startup
    pub fullscreen_on_start: bool,
    /// Delay between maximize and fullscreen
    pub fullscreen_delay_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            fullscreen_on_start: true,
            fullscreen_delay_ms: 500,
        }
    }
}

impl WindowConfig {
    /// Fullscreen delay as a `Duration`
    #[must_use]
    pub fn fullscreen_delay(&self) -> Duration {
        Duration::from_millis(self.fullscreen_delay_ms)
    }
}

/// Scanner backend settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Notification event carrying specimens
    pub event: String,
    /// Fish catalog (JSON array)
    pub catalog_path: Option<PathBuf>,
    /// Newline-delimited scan feed (FIFO or file)
    pub feed_path: Option<PathBuf>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            event: FISH_DATA_EVENT.to_string(),
            catalog_path: None,
            feed_path: None,
        }
    }
}

/// Complete kiosk configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// Specimen display
    pub display: DisplayConfig,
    /// Ambient particles
    pub particles: ParticleConfig,
    /// Window presentation
    pub window: WindowConfig,
    /// Scanner backend
    pub scanner: ScannerConfig,
}

impl KioskConfig {
    /// Parse TOML
    ///
    /// # Errors
    ///
    /// Returns the TOML error on malformed input.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Load and validate a config file
    ///
    /// # Errors
    ///
    /// Fails if the file can't be read, parsed or validated.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let secs = self.display.display_duration_secs;
        if !secs.is_finite() || secs <= 0.0 || secs > MAX_DISPLAY_SECS {
            return Err(ConfigError::Invalid(format!(
                "display.display_duration_secs must be in (0, {MAX_DISPLAY_SECS}], got {secs}"
            )));
        }
        if self.window.fullscreen_delay_ms > MAX_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "window.fullscreen_delay_ms must be at most {MAX_INTERVAL_MS}"
            )));
        }

        let particles = &self.particles;
        if particles.spawn_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "particles.spawn_interval_ms must be positive".into(),
            ));
        }
        if particles.spawn_interval_ms > MAX_INTERVAL_MS
            || particles.removal_buffer_ms > MAX_INTERVAL_MS
        {
            return Err(ConfigError::Invalid(format!(
                "particle intervals must be at most {MAX_INTERVAL_MS} ms"
            )));
        }
        if particles.removal_buffer_ms < 1000 {
            return Err(ConfigError::Invalid(format!(
                "particles.removal_buffer_ms must be at least 1000, got {}",
                particles.removal_buffer_ms
            )));
        }

        let ranges: [(&str, &ValueRange); 3] = [
            ("particles.size", &particles.size),
            ("particles.duration_secs", &particles.duration_secs),
            ("particles.delay_secs", &particles.delay_secs),
        ];
        for (name, range) in ranges {
            if !range.is_valid() {
                return Err(ConfigError::Invalid(format!(
                    "{name} needs finite bounds with min <= max, got {}..{}",
                    range.min, range.max
                )));
            }
        }
        if particles.duration_secs.min < 0.0 || particles.delay_secs.min < 0.0 {
            return Err(ConfigError::Invalid(
                "particle durations and delays can't be negative".into(),
            ));
        }
        if particles.duration_secs.max > MAX_PARTICLE_SECS
            || particles.delay_secs.max > MAX_PARTICLE_SECS
        {
            return Err(ConfigError::Invalid(format!(
                "particle durations and delays must be at most {MAX_PARTICLE_SECS} s"
            )));
        }

        if self.scanner.event.trim().is_empty() {
            return Err(ConfigError::Invalid("scanner.event can't be empty".into()));
        }

        Ok(())
    }

    /// Apply overrides in place
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(secs) = overrides.display_duration_secs {
            self.display.display_duration_secs = secs;
        }
        if let Some(key) = overrides.debug_key {
            self.display.debug_key = Some(key);
        }
        if let Some(max) = overrides.max_particles {
            self.particles.max_particles = max;
        }
        if let Some(path) = &overrides.catalog_path {
            self.scanner.catalog_path = Some(path.clone());
        }
        if let Some(path) = &overrides.feed_path {
            self.scanner.feed_path = Some(path.clone());
        }
        if let Some(fullscreen) = overrides.fullscreen_on_start {
            self.window.fullscreen_on_start = fullscreen;
        }
    }
}

/// Values that take precedence over the config file
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigOverrides {
    /// `KIOSK_DISPLAY_SECONDS`
    pub display_duration_secs: Option<f64>,
    /// `KIOSK_DEBUG_KEY`
    pub debug_key: Option<char>,
    /// `KIOSK_MAX_PARTICLES`
    pub max_particles: Option<usize>,
    /// `KIOSK_CATALOG`
    pub catalog_path: Option<PathBuf>,
    /// `KIOSK_FEED`
    pub feed_path: Option<PathBuf>,
    /// `KIOSK_FULLSCREEN`
    pub fullscreen_on_start: Option<bool>,
}

impl ConfigOverrides {
    /// Read overrides from the process environment
    ///
    /// Environment variables:
    /// - `KIOSK_DISPLAY_SECONDS`: seconds a specimen stays on screen
    /// - `KIOSK_DEBUG_KEY`: single character enabling the debug scan
    /// - `KIOSK_MAX_PARTICLES`: snowfall cap
    /// - `KIOSK_CATALOG`: catalog JSON path
    /// - `KIOSK_FEED`: scan feed path
    /// - `KIOSK_FULLSCREEN`: "0" or "false" to stay windowed
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through an arbitrary lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            display_duration_secs: lookup("KIOSK_DISPLAY_SECONDS")
                .and_then(|v| v.trim().parse().ok()),
            debug_key: lookup("KIOSK_DEBUG_KEY").and_then(|v| single_char(&v)),
            max_particles: lookup("KIOSK_MAX_PARTICLES").and_then(|v| v.trim().parse().ok()),
            catalog_path: lookup("KIOSK_CATALOG")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            feed_path: lookup("KIOSK_FEED")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            fullscreen_on_start: lookup("KIOSK_FULLSCREEN").and_then(|v| parse_flag(&v)),
        }
    }

    /// Layer `other` on top: its set values win
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            display_duration_secs: other.display_duration_secs.or(self.display_duration_secs),
            debug_key: other.debug_key.or(self.debug_key),
            max_particles: other.max_particles.or(self.max_particles),
            catalog_path: other.catalog_path.or(self.catalog_path),
            feed_path: other.feed_path.or(self.feed_path),
            fullscreen_on_start: other.fullscreen_on_start.or(self.fullscreen_on_start),
        }
    }
}

fn single_char(value: &str) -> Option<char> {
    let mut chars = value.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Default config file location
///
/// `$XDG_CONFIG_HOME/polar-kiosk/kiosk.toml`, or `None` when the platform
/// has no config directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("polar-kiosk").join("kiosk.toml"))
}

/// Load configuration without overrides.
///
/// An explicit `KIOSK_CONFIG` path must exist. The default path is only
/// used when present; otherwise built-in defaults apply.
///
/// # Errors
///
/// Fails when the chosen file can't be read, parsed or validated.
pub fn load_config() -> Result<(KioskConfig, ConfigSource), ConfigError> {
    let explicit = std::env::var("KIOSK_CONFIG").ok().map(PathBuf::from);
    load_config_from(explicit.as_deref())
}

/// Load from an explicit path, falling back as [`load_config`] does
///
/// # Errors
///
/// Fails when the chosen file can't be read, parsed or validated.
pub fn load_config_from(path: Option<&Path>) -> Result<(KioskConfig, ConfigSource), ConfigError> {
    if let Some(path) = path {
        let config = KioskConfig::load_from_path(path)?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }

    match default_config_path() {
        Some(path) if path.is_file() => {
            let config = KioskConfig::load_from_path(&path)?;
            Ok((config, ConfigSource::File(path)))
        }
        _ => Ok((KioskConfig::default(), ConfigSource::Defaults)),
    }
}
