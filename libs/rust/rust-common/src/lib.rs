//! Shared library for cross-cutting concerns in auth-platform Rust services.
//!
//! Currently provides the tracing subscriber setup used by every service
//! binary, so log level and output format are configured the same way
//! everywhere.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod tracing_config;

pub use tracing_config::{
    LogFormat, TracingConfig, TracingConfigError, init_tracing, try_init_tracing,
};
