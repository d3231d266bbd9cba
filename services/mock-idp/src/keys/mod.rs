//! Key material management: signing key generation, rotation and the
//! public projection used for JWKS publication.

pub mod manager;
pub mod material;

pub use manager::KeyManager;
pub use material::{KeySettings, KeyState, PublicKeyDescriptor, PublicKeyParams, SigningKey};
