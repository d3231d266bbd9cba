//! JWT claim set.

use crate::error::TokenError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Claim set carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject
    pub sub: String,
    /// Audience
    pub aud: Vec<String>,
    /// Expiration (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Not before (unix seconds)
    pub nbf: i64,
    /// Token ID
    pub jti: String,
}

impl Claims {
    /// Claims issued at `issued_at` (unix seconds) expiring `lifetime_seconds`
    /// later. A negative lifetime yields an already-expired token.
    #[must_use]
    pub fn new(
        issuer: String,
        subject: String,
        audience: Vec<String>,
        issued_at: i64,
        lifetime_seconds: i64,
    ) -> Self {
        Self {
            iss: issuer,
            sub: subject,
            aud: audience,
            exp: issued_at.saturating_add(lifetime_seconds),
            iat: issued_at,
            nbf: issued_at,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Decode the payload of a compact JWT without checking its signature.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::EncodingFailure`] if the token is not three
    /// dot-separated segments or the payload is not a claim set.
    pub fn decode_unverified(token: &str) -> Result<Self, TokenError> {
        let mut parts = token.split('.');
        let (Some(_), Some(payload), Some(_), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::encoding("Invalid token format"));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| TokenError::encoding(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Whether the token is expired at `timestamp`.
    #[must_use]
    pub const fn is_expired_at(&self, timestamp: i64) -> bool {
        self.exp <= timestamp
    }

    /// Whether the token is expired now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }
}
