//! Shared helpers for integration tests.

#![allow(dead_code)]

use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use mock_idp::config::JwtAlgorithm;
use mock_idp::jwks::Jwks;
use mock_idp::jwt::Claims;
use mock_idp::keys::{KeyManager, KeySettings};
use std::sync::Arc;

/// P-256 keys generate quickly enough for property tests.
pub fn ec_manager() -> Arc<KeyManager> {
    let settings = KeySettings {
        algorithm: JwtAlgorithm::ES256,
        ..KeySettings::default()
    };
    Arc::new(KeyManager::generate(settings).expect("EC key generation"))
}

/// Verify `token` using only the published key set, the way a downstream
/// service would.
pub fn verify_with_jwks(
    jwks: &Jwks,
    token: &str,
    audience: &[String],
    check_exp: bool,
) -> Result<Claims, String> {
    let header = decode_header(token).map_err(|e| e.to_string())?;
    let kid = header.kid.ok_or("token header has no kid")?;
    let jwk = jwks
        .find_key(&kid)
        .ok_or_else(|| format!("kid {kid} not published"))?;

    let algorithm: Algorithm = jwk.alg.parse().map_err(|e: jsonwebtoken::errors::Error| e.to_string())?;
    if algorithm != header.alg {
        return Err(format!("header alg {:?} != published {:?}", header.alg, algorithm));
    }

    let mut validation = Validation::new(algorithm);
    validation.set_audience(audience);
    validation.validate_exp = check_exp;
    if !check_exp {
        validation.required_spec_claims.clear();
    }

    let key = jwk.decoding_key().map_err(|e| e.to_string())?;
    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| e.to_string())
}
