//! Runtime settings.
//!
//! Layered lowest to highest: built-in defaults, an optional TOML file,
//! `FLOWVAULT_*` environment variables, command-line flags.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::ingest::DEFAULT_MAX_LINE_BYTES;

/// Environment variable prefix, e.g. `FLOWVAULT_BATCH_PERIOD=250ms`.
pub const ENV_PREFIX: &str = "FLOWVAULT";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("invalid duration {0:?}: expected a number with a ns, us, ms or s suffix")]
    InvalidDuration(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Resolved settings for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// How long the transport accumulates observations per batch.
    pub batch_period: Duration,
    /// Longest accepted input line, newline included.
    pub max_line_bytes: usize,
    /// Bound of the queue between the ingest loop and the transport.
    pub channel_capacity: usize,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

/// Values given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub batch_period: Option<String>,
    pub max_line_bytes: Option<usize>,
    pub log_level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    batch_period: String,
    max_line_bytes: usize,
    channel_capacity: usize,
    log_level: String,
}

impl Settings {
    pub fn load(overrides: &Overrides) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .set_default("batch_period", "1s")?
            .set_default("max_line_bytes", DEFAULT_MAX_LINE_BYTES as i64)?
            .set_default("channel_capacity", flowvault_sdk::DEFAULT_CAPACITY as i64)?
            .set_default("log_level", "info")?;

        if let Some(path) = &overrides.config_file {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        let raw: RawSettings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .set_override_option("batch_period", overrides.batch_period.clone())?
            .set_override_option(
                "max_line_bytes",
                overrides.max_line_bytes.map(|n| n as i64),
            )?
            .set_override_option("log_level", overrides.log_level.clone())?
            .build()?
            .try_deserialize()?;

        let settings = Settings {
            batch_period: parse_duration(&raw.batch_period)?,
            max_line_bytes: raw.max_line_bytes,
            channel_capacity: raw.channel_capacity,
            log_level: raw.log_level,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.batch_period.is_zero() {
            return Err(SettingsError::Zero("batch_period"));
        }
        if self.max_line_bytes == 0 {
            return Err(SettingsError::Zero("max_line_bytes"));
        }
        if self.channel_capacity == 0 {
            return Err(SettingsError::Zero("channel_capacity"));
        }
        Ok(())
    }
}

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
];

/// Parse duration strings like "1s", "250ms", "1.5s", "500us".
pub fn parse_duration(s: &str) -> Result<Duration, SettingsError> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str
                .trim()
                .parse()
                .map_err(|_| SettingsError::InvalidDuration(s.to_string()))?;
            if !val.is_finite() || val < 0.0 {
                return Err(SettingsError::InvalidDuration(s.to_string()));
            }
            return Ok(Duration::from_nanos((val * multiplier) as u64));
        }
    }

    Err(SettingsError::InvalidDuration(s.to_string()))
}
