//! Configuration types for probe runs.

use crate::errors::ConfigError;
use crate::scheduler::Parallelism;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Configuration for a probe run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Worker count for `map` and `parallel`.
    #[serde(default)]
    pub parallelism: Parallelism,
    /// DNS lookup sub-timeout in seconds.
    #[serde(default = "default_dns_timeout")]
    pub dns_timeout_seconds: f64,
    /// TCP connect sub-timeout in seconds.
    #[serde(default = "default_tcp_connect_timeout")]
    pub tcp_connect_timeout_seconds: f64,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_dns_timeout() -> f64 {
    4.0
}

fn default_tcp_connect_timeout() -> f64 {
    15.0
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            parallelism: Parallelism::default(),
            dns_timeout_seconds: default_dns_timeout(),
            tcp_connect_timeout_seconds: default_tcp_connect_timeout(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ProbeConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Checks that every timeout is positive and finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_timeout("dns_timeout_seconds", self.dns_timeout_seconds)?;
        check_timeout("tcp_connect_timeout_seconds", self.tcp_connect_timeout_seconds)?;
        Ok(())
    }

    /// Sets the worker count.
    #[must_use]
    pub fn with_parallelism(mut self, parallelism: impl Into<Parallelism>) -> Self {
        self.parallelism = parallelism.into();
        self
    }

    /// Sets the DNS timeout.
    #[must_use]
    pub fn with_dns_timeout(mut self, seconds: f64) -> Self {
        self.dns_timeout_seconds = seconds;
        self
    }

    /// Sets the TCP connect timeout.
    #[must_use]
    pub fn with_tcp_connect_timeout(mut self, seconds: f64) -> Self {
        self.tcp_connect_timeout_seconds = seconds;
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Gets the DNS timeout as Duration.
    ///
    /// Falls back to the default when the field holds a value `validate`
    /// would reject.
    #[must_use]
    pub fn dns_timeout(&self) -> Duration {
        seconds_or_default(self.dns_timeout_seconds, default_dns_timeout())
    }

    /// Gets the TCP connect timeout as Duration, with the same fallback as
    /// [`ProbeConfig::dns_timeout`].
    #[must_use]
    pub fn tcp_connect_timeout(&self) -> Duration {
        seconds_or_default(self.tcp_connect_timeout_seconds, default_tcp_connect_timeout())
    }
}

// Builders and direct deserialization skip `validate`, so negative, NaN or
// overflowing values can still reach here.
fn seconds_or_default(seconds: f64, default: f64) -> Duration {
    Duration::try_from_secs_f64(seconds)
        .ok()
        .filter(|timeout| !timeout.is_zero())
        .unwrap_or_else(|| Duration::from_secs_f64(default))
}

fn check_timeout(field: &str, seconds: f64) -> Result<(), ConfigError> {
    if seconds.is_finite() && seconds > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be a positive number of seconds, got {seconds}")))
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Sets the filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}
