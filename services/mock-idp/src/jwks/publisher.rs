//! Key-Set Publisher.
//!
//! Renders the key manager's public keys as a JWKS document. The document
//! is rebuilt on every call so it always matches the current key ring.

use crate::error::TokenError;
use crate::keys::{KeyManager, PublicKeyDescriptor, PublicKeyParams};
use crate::metrics;
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Family-specific public parameters, tagged by `kty`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kty")]
pub enum JwkParams {
    /// RSA modulus and exponent
    #[serde(rename = "RSA")]
    Rsa {
        /// Modulus
        n: String,
        /// Public exponent
        e: String,
    },
    /// Elliptic-curve point
    #[serde(rename = "EC")]
    Ec {
        /// Curve name
        crv: String,
        /// X coordinate
        x: String,
        /// Y coordinate
        y: String,
    },
}

/// One published public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key ID
    pub kid: String,
    /// Key use, always `sig`
    #[serde(rename = "use")]
    pub key_use: String,
    /// Signing algorithm
    pub alg: String,
    /// Public parameters
    #[serde(flatten)]
    pub params: JwkParams,
}

impl Jwk {
    /// Build a verification key from the published parameters alone.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::EncodingFailure`] if the parameters are not
    /// valid base64url key material.
    pub fn decoding_key(&self) -> Result<DecodingKey, TokenError> {
        let key = match &self.params {
            JwkParams::Rsa { n, e } => DecodingKey::from_rsa_components(n, e)?,
            JwkParams::Ec { x, y, .. } => DecodingKey::from_ec_components(x, y)?,
        };
        Ok(key)
    }

    /// `kty` value.
    #[must_use]
    pub const fn key_type(&self) -> &'static str {
        match self.params {
            JwkParams::Rsa { .. } => "RSA",
            JwkParams::Ec { .. } => "EC",
        }
    }
}

impl From<&PublicKeyDescriptor> for Jwk {
    fn from(descriptor: &PublicKeyDescriptor) -> Self {
        let params = match &descriptor.public {
            PublicKeyParams::Rsa { n, e } => JwkParams::Rsa {
                n: n.clone(),
                e: e.clone(),
            },
            PublicKeyParams::Ec { crv, x, y } => JwkParams::Ec {
                crv: crv.clone(),
                x: x.clone(),
                y: y.clone(),
            },
        };
        Self {
            kid: descriptor.kid.clone(),
            key_use: "sig".to_string(),
            alg: descriptor.algorithm.as_str().to_string(),
            params,
        }
    }
}

/// JWKS document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    /// Published keys
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// Look up a key by `kid`.
    #[must_use]
    pub fn find_key(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }

    /// Published key IDs, in document order.
    #[must_use]
    pub fn kids(&self) -> Vec<&str> {
        self.keys.iter().map(|k| k.kid.as_str()).collect()
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::EncodingFailure`] if serialization fails.
    pub fn to_json(&self) -> Result<String, TokenError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Projects the key manager's public keys into a [`Jwks`].
pub struct JwksPublisher {
    keys: Arc<KeyManager>,
}

impl JwksPublisher {
    /// Create a publisher over `keys`.
    #[must_use]
    pub const fn new(keys: Arc<KeyManager>) -> Self {
        Self { keys }
    }

    /// Render every retained key, current first, without omission.
    #[must_use]
    pub fn publish(&self) -> Jwks {
        let descriptors = self.keys.public_keys();
        metrics::record_jwks_published();
        metrics::set_retained_keys(descriptors.len());

        Jwks {
            keys: descriptors.iter().map(Jwk::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtAlgorithm;
    use crate::keys::KeySettings;

    fn ec_manager() -> Arc<KeyManager> {
        let settings = KeySettings {
            algorithm: JwtAlgorithm::ES256,
            ..KeySettings::default()
        };
        Arc::new(KeyManager::generate(settings).unwrap())
    }

    fn rsa_jwk(kid: &str) -> Jwk {
        Jwk {
            kid: kid.to_string(),
            key_use: "sig".to_string(),
            alg: "RS256".to_string(),
            params: JwkParams::Rsa {
                n: "test-n".to_string(),
                e: "AQAB".to_string(),
            },
        }
    }

    #[test]
    fn test_publish_single_key() {
        let manager = ec_manager();
        let publisher = JwksPublisher::new(Arc::clone(&manager));

        let jwks = publisher.publish();
        assert_eq!(jwks.keys.len(), 1);
        assert_eq!(jwks.keys[0].kid, manager.current_key().unwrap().kid());
        assert_eq!(jwks.keys[0].alg, "ES256");
        assert_eq!(jwks.keys[0].key_use, "sig");
        assert_eq!(jwks.keys[0].key_type(), "EC");
    }

    #[test]
    fn test_publish_after_rotation() {
        let manager = ec_manager();
        let publisher = JwksPublisher::new(Arc::clone(&manager));
        let first = manager.current_key().unwrap();
        let second = manager.rotate().unwrap();

        let jwks = publisher.publish();
        assert_eq!(jwks.kids(), vec![second.kid(), first.kid()]);
    }

    #[test]
    fn test_empty_manager_publishes_empty_set() {
        let publisher = JwksPublisher::new(Arc::new(KeyManager::new(KeySettings::default())));
        assert!(publisher.publish().keys.is_empty());
    }

    #[test]
    fn test_rsa_jwk_serialization_shape() {
        let json = serde_json::to_value(rsa_jwk("key-1")).unwrap();
        assert_eq!(json["kty"], "RSA");
        assert_eq!(json["kid"], "key-1");
        assert_eq!(json["use"], "sig");
        assert_eq!(json["n"], "test-n");
        assert_eq!(json["e"], "AQAB");
        assert!(json.get("x").is_none());
        assert!(json.get("crv").is_none());
    }

    #[test]
    fn test_ec_jwk_serialization_shape() {
        let jwks = JwksPublisher::new(ec_manager()).publish();
        let json = serde_json::to_value(&jwks.keys[0]).unwrap();
        assert_eq!(json["kty"], "EC");
        assert_eq!(json["crv"], "P-256");
        assert!(json["x"].as_str().is_some_and(|x| !x.is_empty()));
        assert!(json["y"].as_str().is_some_and(|y| !y.is_empty()));
        assert!(json.get("n").is_none());
        assert!(json.get("e").is_none());
        assert!(json.get("d").is_none());
    }

    #[test]
    fn test_jwk_round_trips_through_json() {
        let jwks = Jwks {
            keys: vec![rsa_jwk("key-1")],
        };
        let parsed: Jwks = serde_json::from_str(&jwks.to_json().unwrap()).unwrap();
        assert_eq!(parsed, jwks);
    }

    #[test]
    fn test_find_key() {
        let jwks = Jwks {
            keys: vec![rsa_jwk("key-1"), rsa_jwk("key-2")],
        };

        assert_eq!(jwks.find_key("key-2").map(|k| k.kid.as_str()), Some("key-2"));
        assert!(jwks.find_key("missing").is_none());
    }

    #[test]
    fn test_decoding_key_rejects_garbage() {
        let mut jwk = rsa_jwk("bad");
        jwk.params = JwkParams::Rsa {
            n: "!!!".to_string(),
            e: "AQAB".to_string(),
        };
        assert!(jwk.decoding_key().is_err());
    }
}
