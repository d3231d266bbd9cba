//! Tracing subscriber configuration.
//!
//! Services build a [`TracingConfig`] from their environment and install it
//! once at startup. `RUST_LOG` always wins over the configured level.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Invalid logging settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TracingConfigError {
    /// `LOG_LEVEL` is not a valid filter directive.
    #[error("Invalid LOG_LEVEL {value:?}: {reason}")]
    InvalidLogLevel {
        /// Rejected value
        value: String,
        /// Parser message
        reason: String,
    },

    /// `LOG_FORMAT` is neither `text` nor `json`.
    #[error("Invalid LOG_FORMAT {0:?}: expected text or json")]
    InvalidLogFormat(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = TracingConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(TracingConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "rust-service".to_string(),
            log_level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl TracingConfig {
    /// Build a config from `LOG_LEVEL` and `LOG_FORMAT` via `lookup`.
    ///
    /// Unset or blank variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `LOG_LEVEL` is not a valid filter directive or
    /// `LOG_FORMAT` is not a known format.
    pub fn from_lookup<F>(
        service_name: impl Into<String>,
        lookup: F,
    ) -> Result<Self, TracingConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_level = match lookup("LOG_LEVEL").filter(|v| !v.trim().is_empty()) {
            Some(level) => {
                let level = level.trim().to_string();
                EnvFilter::try_new(&level).map_err(|e| TracingConfigError::InvalidLogLevel {
                    value: level.clone(),
                    reason: e.to_string(),
                })?;
                level
            }
            None => defaults.log_level,
        };

        let format = match lookup("LOG_FORMAT").filter(|v| !v.trim().is_empty()) {
            Some(format) => format.parse()?,
            None => defaults.format,
        };

        Ok(Self {
            service_name: service_name.into(),
            log_level,
            format,
        })
    }

    /// Build a config from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Self::from_lookup`].
    pub fn from_env(service_name: impl Into<String>) -> Result<Self, TracingConfigError> {
        Self::from_lookup(service_name, |name| std::env::var(name).ok())
    }

    /// Set the service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Set the default log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Switch to JSON output.
    #[must_use]
    pub const fn with_json_output(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
    }
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn try_init_tracing(config: &TracingConfig) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(config.filter());

    match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
    }

    tracing::info!(
        service = %config.service_name,
        format = %config.format,
        "tracing initialized"
    );
    Ok(())
}

/// Install the global subscriber, ignoring an already-installed one.
pub fn init_tracing(config: &TracingConfig) {
    if try_init_tracing(config).is_err() {
        tracing::debug!("global tracing subscriber already installed");
    }
}
