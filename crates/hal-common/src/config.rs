//! Configuration structures for the platform layer.
//!
//! Supports TOML deserialization with defaults that keep the
//! behaviour existing HAL callers rely on.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "HAL_CONFIG_PATH";

/// System-wide configuration path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/hal/platform.toml";

/// Local development configuration path.
pub const LOCAL_CONFIG_PATH: &str = "config/default.toml";

/// Top-level platform configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Sleep behaviour.
    pub sleep: SleepConfig,

    /// Entropy source behaviour.
    pub random: RandomConfig,

    /// Cycle counter conversion.
    pub cycles: CyclesConfig,
}

/// Sleep configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepConfig {
    /// Re-enter the sleep after a signal interrupts it, until the full
    /// duration has elapsed.
    pub resume_on_interrupt: bool,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            resume_on_interrupt: true,
        }
    }
}

/// How the entropy source handles partial results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RandomMode {
    /// Keep calling the OS until the buffer is full.
    #[default]
    Fill,
    /// Issue one call; a short read is reported as an error.
    Single,
}

/// Entropy source configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomConfig {
    /// Partial-read handling.
    pub mode: RandomMode,

    /// Fail with `EAGAIN` instead of blocking when the pool is not yet initialized.
    pub nonblocking: bool,
}

/// Cycle-to-nanosecond conversion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CycleConversion {
    /// Ignore the input and report the OS clock ticks per second.
    /// Matches what existing callers of the C interface observe.
    #[default]
    ClockTicks,
    /// Scale by the measured counter frequency.
    Calibrated,
}

/// Cycle counter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CyclesConfig {
    /// Conversion strategy.
    pub conversion: CycleConversion,

    /// How long to sample the counter against the monotonic clock.
    #[serde(with = "humantime_serde")]
    pub calibration_window: Duration,
}

impl Default for CyclesConfig {
    fn default() -> Self {
        Self {
            conversion: CycleConversion::ClockTicks,
            calibration_window: Duration::from_millis(10),
        }
    }
}

impl PlatformConfig {
    /// Shortest accepted calibration window.
    pub const MIN_CALIBRATION_WINDOW: Duration = Duration::from_millis(1);

    /// Longest accepted calibration window.
    pub const MAX_CALIBRATION_WINDOW: Duration = Duration::from_secs(1);

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the calibration window is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let window = self.cycles.calibration_window;
        if window < Self::MIN_CALIBRATION_WINDOW || window > Self::MAX_CALIBRATION_WINDOW {
            return Err(ConfigError::Invalid(format!(
                "cycles.calibration_window must be between {} and {}, got {}",
                humantime::format_duration(Self::MIN_CALIBRATION_WINDOW),
                humantime::format_duration(Self::MAX_CALIBRATION_WINDOW),
                humantime::format_duration(window),
            )));
        }
        Ok(())
    }

    /// Resolve and load configuration.
    ///
    /// Resolution priority (first existing file wins):
    /// 1. `explicit` path
    /// 2. `HAL_CONFIG_PATH` environment variable
    /// 3. `/etc/hal/platform.toml` (system path)
    /// 4. `config/default.toml` (local development)
    /// 5. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the selected file cannot be read or parsed.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            info!(?path, "Loading platform config from explicit path");
            return Self::from_file(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                info!(?path, "Loading platform config from {CONFIG_PATH_ENV}");
                return Self::from_file(&path);
            }
            warn!(
                path = %env_path,
                "{CONFIG_PATH_ENV} set but file does not exist, checking other locations"
            );
        }

        for candidate in [SYSTEM_CONFIG_PATH, LOCAL_CONFIG_PATH] {
            let path = Path::new(candidate);
            if path.exists() {
                info!(?path, "Loading platform config");
                return Self::from_file(path);
            }
        }

        info!("No platform config found, using built-in defaults");
        Ok(Self::default())
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of its accepted range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
