//! Key-set publication as a JWKS document.

pub mod publisher;

pub use publisher::{Jwk, JwkParams, Jwks, JwksPublisher};
