//! Prometheus metrics for the mock identity provider.
//!
//! Provides counters and gauges for observability.

use once_cell::sync::Lazy;
use prometheus::{
    CounterVec, Encoder, IntCounter, IntGauge, TextEncoder, register_counter_vec,
    register_int_counter, register_int_gauge,
};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mock_idp_tokens_issued_total",
        "Total number of tokens issued",
        &["validity", "algorithm"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Key rotations counter.
pub static KEY_ROTATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mock_idp_key_rotations_total",
        "Total number of signing keys generated",
        &["algorithm"]
    )
    .expect("Failed to register key_rotations metric")
});

/// Key set publications counter.
pub static JWKS_PUBLISHED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "mock_idp_jwks_published_total",
        "Total number of key set documents rendered"
    )
    .expect("Failed to register jwks_published metric")
});

/// Retained keys gauge.
pub static RETAINED_KEYS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "mock_idp_retained_keys",
        "Signing keys currently published (current and retired)"
    )
    .expect("Failed to register retained_keys metric")
});

/// Record a token issuance.
pub fn record_token_issued(validity: &str, algorithm: &str) {
    TOKENS_ISSUED.with_label_values(&[validity, algorithm]).inc();
}

/// Record a key generation or rotation.
pub fn record_key_rotation(algorithm: &str) {
    KEY_ROTATIONS.with_label_values(&[algorithm]).inc();
}

/// Record a key set publication.
pub fn record_jwks_published() {
    JWKS_PUBLISHED.inc();
}

/// Update the retained keys gauge.
pub fn set_retained_keys(count: usize) {
    RETAINED_KEYS.set(i64::try_from(count).unwrap_or(i64::MAX));
}

/// Render every registered metric in the Prometheus text format.
#[must_use]
pub fn render() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
