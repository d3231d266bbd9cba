//! Mock identity provider library.
//!
//! Issues signed JWTs (optionally pre-expired) and publishes the matching
//! public keys as a JWKS document so services can validate tokens offline.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod http;
pub mod jwks;
pub mod jwt;
pub mod keys;
pub mod metrics;
pub mod rotation;
pub mod shutdown;

// Re-exports for convenience
pub use config::Config;
pub use error::TokenError;
