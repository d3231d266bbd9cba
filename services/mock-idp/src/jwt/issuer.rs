//! Token Issuer.
//!
//! Builds a claim set for the requested [`Validity`], signs it with the key
//! manager's current key and returns the compact JWT. Nothing about the
//! token is kept after it is returned.

use crate::error::TokenError;
use crate::jwt::claims::Claims;
use crate::keys::KeyManager;
use crate::metrics;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Requested validity of an issued token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Validity {
    /// Expires after the configured lifetime.
    Normal,
    /// Already past expiry when issued; signature and structure stay valid.
    Expired,
}

impl Validity {
    /// Metric/log label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Expired => "expired",
        }
    }
}

/// Claim values and lifetimes used for every token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerSettings {
    /// `iss` claim
    pub issuer: String,
    /// `sub` claim
    pub subject: String,
    /// `aud` claim
    pub audience: Vec<String>,
    /// Lifetime of [`Validity::Normal`] tokens
    pub lifetime: Duration,
    /// How far before issuance [`Validity::Expired`] tokens expire
    pub expired_offset: Duration,
}

impl Default for IssuerSettings {
    fn default() -> Self {
        Self {
            issuer: "mock-idp".to_string(),
            subject: "test-user".to_string(),
            audience: vec!["mock-idp-clients".to_string()],
            lifetime: Duration::from_secs(900),
            expired_offset: Duration::from_secs(300),
        }
    }
}

/// Issues signed tokens with the current key.
pub struct TokenIssuer {
    keys: Arc<KeyManager>,
    settings: IssuerSettings,
}

impl TokenIssuer {
    /// Create an issuer backed by `keys`.
    #[must_use]
    pub const fn new(keys: Arc<KeyManager>, settings: IssuerSettings) -> Self {
        Self { keys, settings }
    }

    /// Issue a token as of now.
    ///
    /// # Errors
    ///
    /// See [`Self::issue_at`].
    pub fn issue(&self, validity: Validity) -> Result<String, TokenError> {
        self.issue_at(validity, Utc::now())
    }

    /// Issue a token as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::SigningUnavailable`] if the key manager has no
    /// current key, and [`TokenError::EncodingFailure`] if signing fails.
    pub fn issue_at(&self, validity: Validity, now: DateTime<Utc>) -> Result<String, TokenError> {
        let key = self.keys.current_key().map_err(|err| match err {
            TokenError::NoKeyAvailable => TokenError::SigningUnavailable,
            other => other,
        })?;

        let claims = Claims::new(
            self.settings.issuer.clone(),
            self.settings.subject.clone(),
            self.settings.audience.clone(),
            now.timestamp(),
            self.lifetime_seconds(validity)?,
        );
        let token = key.sign(&claims)?;

        metrics::record_token_issued(validity.as_str(), key.algorithm().as_str());
        debug!(
            kid = key.kid(),
            jti = %claims.jti,
            validity = validity.as_str(),
            exp = claims.exp,
            "Issued token"
        );
        Ok(token)
    }

    fn lifetime_seconds(&self, validity: Validity) -> Result<i64, TokenError> {
        let (duration, sign) = match validity {
            Validity::Normal => (self.settings.lifetime, 1),
            Validity::Expired => (self.settings.expired_offset, -1),
        };
        let seconds = i64::try_from(duration.as_secs())
            .map_err(|_| TokenError::encoding(format!("lifetime out of range: {duration:?}")))?;
        Ok(sign * seconds)
    }
}
