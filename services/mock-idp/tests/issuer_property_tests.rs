//! Property-based tests for token issuance.
//!
//! For arbitrary clocks and lifetimes: normal tokens expire after issuance,
//! expired tokens are already past expiry, and every token verifies against
//! the published key set.

mod common;

use chrono::{TimeZone, Utc};
use mock_idp::jwks::JwksPublisher;
use mock_idp::jwt::{Claims, IssuerSettings, TokenIssuer, Validity};
use mock_idp::keys::KeyManager;
use once_cell::sync::Lazy;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

static KEYS: Lazy<Arc<KeyManager>> = Lazy::new(common::ec_manager);

fn arb_now() -> impl Strategy<Value = i64> {
    // 2001-09-09 .. 2096-10-02
    1_000_000_000i64..4_000_000_000i64
}

fn arb_seconds() -> impl Strategy<Value = u64> {
    1u64..86_400u64
}

fn arb_validity() -> impl Strategy<Value = Validity> {
    prop_oneof![Just(Validity::Normal), Just(Validity::Expired)]
}

fn arb_audience() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z][a-z0-9-]{0,15}", 1..4)
}

fn issuer(lifetime: u64, offset: u64, audience: Vec<String>) -> TokenIssuer {
    TokenIssuer::new(
        Arc::clone(&KEYS),
        IssuerSettings {
            audience,
            lifetime: Duration::from_secs(lifetime),
            expired_offset: Duration::from_secs(offset),
            ..IssuerSettings::default()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Normal tokens expire exactly `lifetime` after issuance.
    #[test]
    fn prop_normal_token_expires_after_issuance(
        now in arb_now(),
        lifetime in arb_seconds(),
    ) {
        let issued_at = Utc.timestamp_opt(now, 0).unwrap();
        let token = issuer(lifetime, 300, vec!["api".into()])
            .issue_at(Validity::Normal, issued_at)
            .unwrap();
        let claims = Claims::decode_unverified(&token).unwrap();

        prop_assert_eq!(claims.iat, now);
        prop_assert!(claims.exp > claims.iat);
        prop_assert_eq!(claims.exp - claims.iat, i64::try_from(lifetime).unwrap());
    }

    /// Expired tokens are at or past expiry at the moment of issuance.
    #[test]
    fn prop_expired_token_is_past_expiry(
        now in arb_now(),
        offset in arb_seconds(),
    ) {
        let issued_at = Utc.timestamp_opt(now, 0).unwrap();
        let token = issuer(900, offset, vec!["api".into()])
            .issue_at(Validity::Expired, issued_at)
            .unwrap();
        let claims = Claims::decode_unverified(&token).unwrap();

        prop_assert_eq!(claims.iat, now);
        prop_assert!(claims.exp <= now);
        prop_assert_eq!(now - claims.exp, i64::try_from(offset).unwrap());
    }

    /// Every token's kid is published and its signature verifies with the
    /// published parameters.
    #[test]
    fn prop_token_verifies_against_published_keys(
        validity in arb_validity(),
        audience in arb_audience(),
    ) {
        let token = issuer(900, 300, audience.clone()).issue(validity).unwrap();
        let jwks = JwksPublisher::new(Arc::clone(&KEYS)).publish();

        prop_assert!(!jwks.keys.is_empty());
        let claims = common::verify_with_jwks(&jwks, &token, &audience, false);
        prop_assert!(claims.is_ok(), "verification failed: {:?}", claims.as_ref().err());
        prop_assert_eq!(claims.unwrap().aud, audience);
    }
}

#[test]
fn test_normal_token_passes_default_expiry_check() {
    let audience = vec!["api".to_string()];
    let token = issuer(900, 300, audience.clone())
        .issue(Validity::Normal)
        .unwrap();
    let jwks = JwksPublisher::new(Arc::clone(&KEYS)).publish();

    assert!(common::verify_with_jwks(&jwks, &token, &audience, true).is_ok());
}

#[test]
fn test_expired_token_fails_default_expiry_check() {
    let audience = vec!["api".to_string()];
    let token = issuer(900, 300, audience.clone())
        .issue(Validity::Expired)
        .unwrap();
    let jwks = JwksPublisher::new(Arc::clone(&KEYS)).publish();

    let err = common::verify_with_jwks(&jwks, &token, &audience, true).unwrap_err();
    assert!(err.contains("ExpiredSignature"), "unexpected error: {err}");
}

#[test]
fn test_concurrent_issuance() {
    let issuer = Arc::new(issuer(900, 300, vec!["api".into()]));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let issuer = Arc::clone(&issuer);
            std::thread::spawn(move || {
                (0..10)
                    .map(|_| issuer.issue(Validity::Normal).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut jtis = std::collections::HashSet::new();
    for handle in handles {
        for token in handle.join().unwrap() {
            jtis.insert(Claims::decode_unverified(&token).unwrap().jti);
        }
    }
    assert_eq!(jtis.len(), 80);
}
