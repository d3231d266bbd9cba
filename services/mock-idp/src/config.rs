//! Centralized configuration for the mock identity provider.
//!
//! All configuration is loaded from environment variables and validated
//! at startup.

use crate::error::TokenError;
use crate::jwt::IssuerSettings;
use crate::keys::KeySettings;
use rust_common::TracingConfig;
use std::str::FromStr;
use std::time::Duration;

/// Service name used in logs.
pub const SERVICE_NAME: &str = "mock-idp-service";

/// Smallest RSA modulus the signing backend accepts.
pub const MIN_RSA_KEY_BITS: usize = 2048;

/// JWT signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JwtAlgorithm {
    /// RSA PKCS#1 v1.5 with SHA-256
    RS256,
    /// RSA-PSS with SHA-256
    PS256,
    /// ECDSA with P-256 and SHA-256
    ES256,
}

/// Key family an algorithm signs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    /// RSA keys (`kty = "RSA"`)
    Rsa,
    /// Elliptic-curve keys (`kty = "EC"`)
    Ec,
}

impl JwtAlgorithm {
    /// Algorithm name for the JWT header and JWK `alg`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::PS256 => "PS256",
            Self::ES256 => "ES256",
        }
    }

    /// Key family required by this algorithm.
    #[must_use]
    pub const fn family(&self) -> KeyFamily {
        match self {
            Self::RS256 | Self::PS256 => KeyFamily::Rsa,
            Self::ES256 => KeyFamily::Ec,
        }
    }

    /// Matching `jsonwebtoken` algorithm.
    #[must_use]
    pub const fn to_jwt(&self) -> jsonwebtoken::Algorithm {
        match self {
            Self::RS256 => jsonwebtoken::Algorithm::RS256,
            Self::PS256 => jsonwebtoken::Algorithm::PS256,
            Self::ES256 => jsonwebtoken::Algorithm::ES256,
        }
    }
}

impl FromStr for JwtAlgorithm {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RS256" => Ok(Self::RS256),
            "PS256" => Ok(Self::PS256),
            "ES256" => Ok(Self::ES256),
            _ => Err(TokenError::config(format!("Invalid JWT algorithm: {s}"))),
        }
    }
}

impl std::fmt::Display for JwtAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Server settings
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    // JWT settings
    /// `iss` claim
    pub jwt_issuer: String,
    /// `sub` claim
    pub jwt_subject: String,
    /// `aud` claim
    pub jwt_audience: Vec<String>,
    /// Signing algorithm
    pub jwt_algorithm: JwtAlgorithm,
    /// Lifetime of normal tokens
    pub access_token_ttl: Duration,
    /// How far in the past expired tokens expire
    pub expired_token_offset: Duration,

    // Key settings
    /// RSA modulus size in bits
    pub rsa_key_bits: usize,
    /// Periodic rotation interval, `None` when disabled
    pub key_rotation_interval: Option<Duration>,

    // Observability
    /// Tracing subscriber settings
    pub tracing: TracingConfig,
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TokenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let rotation_secs: u64 = parse_var(&lookup, "KEY_ROTATION_INTERVAL", 0)?;

        let config = Self {
            host: var("HOST", "0.0.0.0"),
            port: parse_var(&lookup, "PORT", 8080)?,
            jwt_issuer: var("JWT_ISSUER", "mock-idp"),
            jwt_subject: var("JWT_SUBJECT", "test-user"),
            jwt_audience: parse_list(&var("JWT_AUDIENCE", "mock-idp-clients")),
            jwt_algorithm: var("JWT_ALGORITHM", "RS256").parse()?,
            access_token_ttl: Duration::from_secs(parse_var(&lookup, "ACCESS_TOKEN_TTL", 900)?),
            expired_token_offset: Duration::from_secs(parse_var(
                &lookup,
                "EXPIRED_TOKEN_OFFSET",
                300,
            )?),
            rsa_key_bits: parse_var(&lookup, "RSA_KEY_BITS", MIN_RSA_KEY_BITS)?,
            key_rotation_interval: (rotation_secs > 0).then(|| Duration::from_secs(rotation_secs)),
            tracing: TracingConfig::from_lookup(SERVICE_NAME, &lookup)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), TokenError> {
        if self.port == 0 {
            return Err(TokenError::config("PORT must be between 1 and 65535"));
        }
        if self.jwt_issuer.trim().is_empty() {
            return Err(TokenError::config("JWT_ISSUER must not be empty"));
        }
        if self.jwt_subject.trim().is_empty() {
            return Err(TokenError::config("JWT_SUBJECT must not be empty"));
        }
        if self.jwt_audience.is_empty() {
            return Err(TokenError::config(
                "JWT_AUDIENCE must name at least one audience",
            ));
        }
        if self.access_token_ttl.is_zero() {
            return Err(TokenError::config("ACCESS_TOKEN_TTL must be greater than 0"));
        }
        if self.expired_token_offset.is_zero() {
            return Err(TokenError::config(
                "EXPIRED_TOKEN_OFFSET must be greater than 0",
            ));
        }
        if self.jwt_algorithm.family() == KeyFamily::Rsa && self.rsa_key_bits < MIN_RSA_KEY_BITS {
            return Err(TokenError::config(format!(
                "RSA_KEY_BITS must be at least {MIN_RSA_KEY_BITS}, got {}",
                self.rsa_key_bits
            )));
        }
        Ok(())
    }

    /// Address string to bind the HTTP listener to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings for the key material manager.
    #[must_use]
    pub const fn key_settings(&self) -> KeySettings {
        KeySettings {
            algorithm: self.jwt_algorithm,
            rsa_key_bits: self.rsa_key_bits,
        }
    }

    /// Settings for the token issuer.
    #[must_use]
    pub fn issuer_settings(&self) -> IssuerSettings {
        IssuerSettings {
            issuer: self.jwt_issuer.clone(),
            subject: self.jwt_subject.clone(),
            audience: self.jwt_audience.clone(),
            lifetime: self.access_token_ttl,
            expired_offset: self.expired_token_offset,
        }
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, TokenError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| TokenError::config(format!("Invalid {name}: {e}"))),
        None => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
