//! Signing key pairs and their public parameters.
//!
//! RSA keys come from the `rsa` crate, P-256 keys from `ring`. Both end up as
//! a `jsonwebtoken::EncodingKey` that never leaves this module; callers sign
//! through [`SigningKey::sign`] and only ever see [`PublicKeyParams`].

use crate::config::{JwtAlgorithm, KeyFamily};
use crate::error::TokenError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header};
use rand::rngs::OsRng;
use ring::rand::SystemRandom;
use ring::signature::{ECDSA_P256_SHA256_FIXED_SIGNING, EcdsaKeyPair, KeyPair};
use rsa::RsaPrivateKey;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Curve name published for P-256 keys.
pub const P256_CURVE: &str = "P-256";

/// Parameters for generating signing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySettings {
    /// Signing algorithm; decides the key family
    pub algorithm: JwtAlgorithm,
    /// RSA modulus size, ignored for EC keys
    pub rsa_key_bits: usize,
}

impl Default for KeySettings {
    fn default() -> Self {
        Self {
            algorithm: JwtAlgorithm::RS256,
            rsa_key_bits: crate::config::MIN_RSA_KEY_BITS,
        }
    }
}

/// Lifecycle state of a retained key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyState {
    /// Current signing key
    Active,
    /// Superseded by rotation, kept for verification
    Retired,
}

/// Public half of a key, base64url-encoded (no padding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKeyParams {
    /// RSA modulus and exponent, big-endian
    Rsa {
        /// Modulus
        n: String,
        /// Public exponent
        e: String,
    },
    /// Uncompressed elliptic-curve point
    Ec {
        /// Curve name
        crv: String,
        /// X coordinate
        x: String,
        /// Y coordinate
        y: String,
    },
}

impl PublicKeyParams {
    /// JWK `kty` value.
    #[must_use]
    pub const fn key_type(&self) -> &'static str {
        match self {
            Self::Rsa { .. } => "RSA",
            Self::Ec { .. } => "EC",
        }
    }

    /// RFC 7638 JWK thumbprint, used as the `kid`.
    #[must_use]
    pub fn thumbprint(&self) -> String {
        let hash = Sha256::digest(self.canonical_json().as_bytes());
        URL_SAFE_NO_PAD.encode(hash)
    }

    // Required members only, lexicographic order, no whitespace.
    fn canonical_json(&self) -> String {
        match self {
            Self::Rsa { n, e } => format!(r#"{{"e":"{e}","kty":"RSA","n":"{n}"}}"#),
            Self::Ec { crv, x, y } => {
                format!(r#"{{"crv":"{crv}","kty":"EC","x":"{x}","y":"{y}"}}"#)
            }
        }
    }
}

/// Public view of a retained key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyDescriptor {
    /// Key identifier
    pub kid: String,
    /// Signing algorithm
    pub algorithm: JwtAlgorithm,
    /// Lifecycle state
    pub state: KeyState,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Public parameters
    pub public: PublicKeyParams,
}

/// An asymmetric signing key pair. Immutable once created.
pub struct SigningKey {
    kid: String,
    algorithm: JwtAlgorithm,
    created_at: DateTime<Utc>,
    public: PublicKeyParams,
    encoding_key: EncodingKey,
}

impl SigningKey {
    /// Generate a fresh key pair for `settings.algorithm`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::KeyGeneration`] if the entropy source or the key
    /// encoding fails.
    pub fn generate(settings: &KeySettings) -> Result<Self, TokenError> {
        let (public, encoding_key) = match settings.algorithm.family() {
            KeyFamily::Rsa => generate_rsa(settings.rsa_key_bits)?,
            KeyFamily::Ec => generate_p256()?,
        };

        Ok(Self {
            kid: public.thumbprint(),
            algorithm: settings.algorithm,
            created_at: Utc::now(),
            public,
            encoding_key,
        })
    }

    /// Key identifier.
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Signing algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> JwtAlgorithm {
        self.algorithm
    }

    /// Public parameters.
    #[must_use]
    pub const fn public(&self) -> &PublicKeyParams {
        &self.public
    }

    /// Public descriptor for this key in the given state.
    #[must_use]
    pub fn descriptor(&self, state: KeyState) -> PublicKeyDescriptor {
        PublicKeyDescriptor {
            kid: self.kid.clone(),
            algorithm: self.algorithm,
            state,
            created_at: self.created_at,
            public: self.public.clone(),
        }
    }

    /// Serialize `claims` and sign them into a compact JWT whose header
    /// carries this key's `kid`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::EncodingFailure`] if serialization or signing
    /// fails.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        let mut header = Header::new(self.algorithm.to_jwt());
        header.kid = Some(self.kid.clone());
        Ok(jsonwebtoken::encode(&header, claims, &self.encoding_key)?)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .field("created_at", &self.created_at)
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

fn generate_rsa(bits: usize) -> Result<(PublicKeyParams, EncodingKey), TokenError> {
    let private_key = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| TokenError::key_generation(format!("RSA-{bits}: {e}")))?;

    let der = private_key
        .to_pkcs1_der()
        .map_err(|e| TokenError::key_generation(format!("PKCS#1 export: {e}")))?;
    let encoding_key = EncodingKey::from_rsa_der(der.as_bytes());

    let public = PublicKeyParams::Rsa {
        n: URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be()),
        e: URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be()),
    };
    Ok((public, encoding_key))
}

fn generate_p256() -> Result<(PublicKeyParams, EncodingKey), TokenError> {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
        .map_err(|e| TokenError::key_generation(format!("P-256: {e}")))?;
    let pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
        .map_err(|e| TokenError::key_generation(format!("P-256 parse: {e}")))?;

    // 0x04 || X (32 bytes) || Y (32 bytes)
    let point = pair.public_key().as_ref();
    if point.len() != 65 || point[0] != 0x04 {
        return Err(TokenError::key_generation(format!(
            "unexpected P-256 public key encoding ({} bytes)",
            point.len()
        )));
    }

    let public = PublicKeyParams::Ec {
        crv: P256_CURVE.to_string(),
        x: URL_SAFE_NO_PAD.encode(&point[1..33]),
        y: URL_SAFE_NO_PAD.encode(&point[33..65]),
    };
    Ok((public, EncodingKey::from_ec_der(pkcs8.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestClaims {
        sub: String,
        exp: i64,
    }

    fn ec_settings() -> KeySettings {
        KeySettings {
            algorithm: JwtAlgorithm::ES256,
            ..KeySettings::default()
        }
    }

    fn test_claims() -> TestClaims {
        TestClaims {
            sub: "user-1".to_string(),
            exp: Utc::now().timestamp() + 600,
        }
    }

    #[test]
    fn test_ec_key_sign_and_verify() {
        let key = SigningKey::generate(&ec_settings()).unwrap();
        let claims = test_claims();

        let token = key.sign(&claims).unwrap();
        let header = decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some(key.kid()));
        assert_eq!(header.alg, jsonwebtoken::Algorithm::ES256);

        let PublicKeyParams::Ec { crv, x, y } = key.public() else {
            panic!("expected EC parameters");
        };
        assert_eq!(crv, P256_CURVE);
        let decoding = DecodingKey::from_ec_components(x, y).unwrap();
        let decoded =
            decode::<TestClaims>(&token, &decoding, &Validation::new(jsonwebtoken::Algorithm::ES256))
                .unwrap();
        assert_eq!(decoded.claims, claims);
    }

    #[test]
    fn test_rsa_key_sign_and_verify() {
        let key = SigningKey::generate(&KeySettings::default()).unwrap();
        let token = key.sign(&test_claims()).unwrap();

        let PublicKeyParams::Rsa { n, e } = key.public() else {
            panic!("expected RSA parameters");
        };
        assert_eq!(e, "AQAB");
        // 2048-bit modulus is 256 bytes, 342 base64url chars
        assert_eq!(n.len(), 342);

        let decoding = DecodingKey::from_rsa_components(n, e).unwrap();
        let result =
            decode::<TestClaims>(&token, &decoding, &Validation::new(jsonwebtoken::Algorithm::RS256));
        assert!(result.is_ok());
    }

    #[test]
    fn test_kid_is_thumbprint() {
        let key = SigningKey::generate(&ec_settings()).unwrap();
        assert_eq!(key.kid(), key.public().thumbprint());
        // SHA-256 digest, base64url without padding
        assert_eq!(key.kid().len(), 43);
    }

    #[test]
    fn test_generated_keys_are_distinct() {
        let a = SigningKey::generate(&ec_settings()).unwrap();
        let b = SigningKey::generate(&ec_settings()).unwrap();
        assert_ne!(a.kid(), b.kid());
        assert_ne!(a.public(), b.public());
    }

    #[test]
    fn test_canonical_json_member_order() {
        let rsa = PublicKeyParams::Rsa {
            n: "n-value".to_string(),
            e: "AQAB".to_string(),
        };
        assert_eq!(rsa.canonical_json(), r#"{"e":"AQAB","kty":"RSA","n":"n-value"}"#);

        let ec = PublicKeyParams::Ec {
            crv: P256_CURVE.to_string(),
            x: "x-value".to_string(),
            y: "y-value".to_string(),
        };
        assert_eq!(
            ec.canonical_json(),
            r#"{"crv":"P-256","kty":"EC","x":"x-value","y":"y-value"}"#
        );
    }

    #[test]
    fn test_rfc7638_reference_thumbprint() {
        // Example key from RFC 7638 section 3.1
        let params = PublicKeyParams::Rsa {
            n: "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw".to_string(),
            e: "AQAB".to_string(),
        };
        assert_eq!(params.thumbprint(), "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs");
    }

    #[test]
    fn test_debug_hides_private_material() {
        let key = SigningKey::generate(&ec_settings()).unwrap();
        let rendered = format!("{key:?}");
        assert!(rendered.contains(key.kid()));
        assert!(!rendered.contains("encoding_key"));
    }

    #[test]
    fn test_descriptor_carries_state() {
        let key = SigningKey::generate(&ec_settings()).unwrap();
        let descriptor = key.descriptor(KeyState::Retired);
        assert_eq!(descriptor.kid, key.kid());
        assert_eq!(descriptor.state, KeyState::Retired);
        assert_eq!(descriptor.public.key_type(), "EC");
    }
}
