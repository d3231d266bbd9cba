//! Error taxonomy for the identity-provider stand-in.
//!
//! Every variant is a server-side failure: the core never produces a partial
//! token or a key descriptor with private material, it fails instead.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Errors raised by key management, issuance and configuration.
#[derive(Error, Debug)]
pub enum TokenError {
    /// No signing key has been generated yet.
    #[error("No signing key available")]
    NoKeyAvailable,

    /// Issuance could not obtain a current signing key.
    #[error("Signing unavailable: no current signing key")]
    SigningUnavailable,

    /// Claims could not be serialized or signed.
    #[error("Token encoding failed: {0}")]
    EncodingFailure(String),

    /// Key pair generation failed.
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Code for [`TokenError::NoKeyAvailable`].
pub const NO_KEY_AVAILABLE: &str = "NO_KEY_AVAILABLE";
/// Code for [`TokenError::SigningUnavailable`].
pub const SIGNING_UNAVAILABLE: &str = "SIGNING_UNAVAILABLE";
/// Code for [`TokenError::EncodingFailure`].
pub const ENCODING_FAILURE: &str = "ENCODING_FAILURE";
/// Code for [`TokenError::KeyGeneration`].
pub const KEY_GENERATION_FAILED: &str = "KEY_GENERATION_FAILED";
/// Code for [`TokenError::Config`].
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";

impl TokenError {
    /// Create an encoding error.
    #[must_use]
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::EncodingFailure(msg.into())
    }

    /// Create a key generation error.
    #[must_use]
    pub fn key_generation(msg: impl Into<String>) -> Self {
        Self::KeyGeneration(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoKeyAvailable => NO_KEY_AVAILABLE,
            Self::SigningUnavailable => SIGNING_UNAVAILABLE,
            Self::EncodingFailure(_) => ENCODING_FAILURE,
            Self::KeyGeneration(_) => KEY_GENERATION_FAILED,
            Self::Config(_) => CONFIG_ERROR,
        }
    }

    /// HTTP status the serving layer reports for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NoKeyAvailable
            | Self::SigningUnavailable
            | Self::EncodingFailure(_)
            | Self::KeyGeneration(_)
            | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::EncodingFailure(err.to_string())
    }
}

impl From<rust_common::TracingConfigError> for TokenError {
    fn from(err: rust_common::TracingConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TokenError {
    fn from(err: serde_json::Error) -> Self {
        Self::EncodingFailure(err.to_string())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error code
    pub error: &'static str,
    /// Human-readable message
    pub message: String,
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        tracing::error!(code = self.code(), error = %self, "request failed");
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
