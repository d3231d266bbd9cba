//! Key Material Manager.
//!
//! Owns the key ring: exactly one current key once initialized, plus every
//! key retired by rotation. All access goes through one `RwLock`; readers
//! take an `Arc` clone so an issuance that captured a key keeps it even if
//! a rotation lands in between.

use crate::error::TokenError;
use crate::keys::material::{KeySettings, KeyState, PublicKeyDescriptor, SigningKey};
use crate::metrics;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Default)]
struct KeyRing {
    current: Option<Arc<SigningKey>>,
    /// Oldest retirement first.
    retired: Vec<Arc<SigningKey>>,
}

impl KeyRing {
    fn len(&self) -> usize {
        self.retired.len() + usize::from(self.current.is_some())
    }
}

/// Holds the signing keys and serializes rotation.
pub struct KeyManager {
    settings: KeySettings,
    ring: RwLock<KeyRing>,
}

impl KeyManager {
    /// Create a manager with no keys. [`Self::rotate`] installs the first one.
    #[must_use]
    pub fn new(settings: KeySettings) -> Self {
        Self {
            settings,
            ring: RwLock::new(KeyRing::default()),
        }
    }

    /// Create a manager with a freshly generated current key.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::KeyGeneration`] if the first key cannot be
    /// generated.
    pub fn generate(settings: KeySettings) -> Result<Self, TokenError> {
        let manager = Self::new(settings);
        manager.rotate()?;
        Ok(manager)
    }

    /// The active signing key.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::NoKeyAvailable`] if no key was ever generated.
    pub fn current_key(&self) -> Result<Arc<SigningKey>, TokenError> {
        self.ring
            .read()
            .current
            .as_ref()
            .map(Arc::clone)
            .ok_or(TokenError::NoKeyAvailable)
    }

    /// Descriptors for every retained key: current first, then retired keys
    /// in the order they were retired.
    ///
    /// The current key leads so a consumer that only reads the first entry
    /// still gets the key new tokens are signed with.
    #[must_use]
    pub fn public_keys(&self) -> Vec<PublicKeyDescriptor> {
        let ring = self.ring.read();
        ring.current
            .iter()
            .map(|key| key.descriptor(KeyState::Active))
            .chain(ring.retired.iter().map(|key| key.descriptor(KeyState::Retired)))
            .collect()
    }

    /// Number of retained keys, current included.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.ring.read().len()
    }

    /// Generate a new key, make it current and retire the previous one.
    ///
    /// Generation runs before the lock is taken; readers only ever see the
    /// ring before or after the swap.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::KeyGeneration`] if the new key cannot be
    /// generated. The ring is left untouched in that case.
    #[instrument(skip(self), fields(algorithm = %self.settings.algorithm))]
    pub fn rotate(&self) -> Result<Arc<SigningKey>, TokenError> {
        let key = Arc::new(SigningKey::generate(&self.settings)?);

        let (previous, retained) = {
            let mut ring = self.ring.write();
            let previous = ring.current.replace(Arc::clone(&key));
            if let Some(prev) = &previous {
                ring.retired.push(Arc::clone(prev));
            }
            (previous, ring.len())
        };

        metrics::record_key_rotation(self.settings.algorithm.as_str());
        metrics::set_retained_keys(retained);

        match previous {
            Some(prev) => info!(
                kid = key.kid(),
                retired_kid = prev.kid(),
                retained,
                "Rotated signing key"
            ),
            None => info!(kid = key.kid(), "Generated initial signing key"),
        }

        Ok(key)
    }
}
