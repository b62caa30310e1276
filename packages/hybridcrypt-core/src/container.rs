//! # Key Container
//!
//! Named RSA key pairs held in memory.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        KEY CONTAINER                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  "alice" ──► Arc<KeyHandle>  (4096-bit, fp 3f9a…)                      │
//! │  "bob"   ──► Arc<KeyHandle>  (2048-bit, fp 71c2…)                      │
//! │                                                                         │
//! │  • create(name, bits)            - always a fresh pair, replaces       │
//! │  • select_or_create(name, bits)  - existing pair, or a new one         │
//! │  • select(name)                  - existing pair or KeyNotFound        │
//! │  • delete(name)                  - drop the pair                       │
//! │  • export_public(name)           - {modulus, exponent} only            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no "current key". Callers pass the handle they selected to
//! every encrypt and decrypt call; handles stay valid after `delete`.
//! Persistence is left to the caller.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::CryptoConfig;
use crate::crypto::{KeyHandle, PublicKeyParams};
use crate::error::{Error, Result};

/// In-memory store of named key pairs
pub struct KeyContainer {
    keys: RwLock<HashMap<String, Arc<KeyHandle>>>,
    default_key_bits: usize,
}

impl KeyContainer {
    /// Create an empty container using the default key size
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
            default_key_bits: CryptoConfig::default().default_key_bits,
        }
    }

    /// Create an empty container using the configured key size
    pub fn with_config(config: &CryptoConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            keys: RwLock::new(HashMap::new()),
            default_key_bits: config.default_key_bits,
        })
    }

    /// Key size used by [`KeyContainer::select_or_create_default`]
    pub fn default_key_bits(&self) -> usize {
        self.default_key_bits
    }

    /// Generate a new pair under `name`, replacing any existing one
    pub fn create(&self, name: &str, bits: usize) -> Result<Arc<KeyHandle>> {
        let handle = Arc::new(KeyHandle::generate(name, bits)?);
        let replaced = self
            .keys
            .write()
            .insert(name.to_string(), Arc::clone(&handle))
            .is_some();

        tracing::info!(
            "Created {}-bit key pair '{}' ({}){}",
            bits,
            name,
            handle.fingerprint(),
            if replaced { ", replacing previous pair" } else { "" }
        );
        Ok(handle)
    }

    /// Return the pair under `name`, generating one of `bits` bits if absent
    ///
    /// An existing pair is returned as is, whatever its size.
    pub fn select_or_create(&self, name: &str, bits: usize) -> Result<Arc<KeyHandle>> {
        if let Some(handle) = self.keys.read().get(name) {
            return Ok(Arc::clone(handle));
        }

        // Generated outside the lock; keygen can take seconds
        let generated = Arc::new(KeyHandle::generate(name, bits)?);

        let mut keys = self.keys.write();
        let handle = keys
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::info!(
                    "Created {}-bit key pair '{}' ({})",
                    bits,
                    name,
                    generated.fingerprint()
                );
                Arc::clone(&generated)
            });
        Ok(Arc::clone(handle))
    }

    /// [`KeyContainer::select_or_create`] with the container's default size
    pub fn select_or_create_default(&self, name: &str) -> Result<Arc<KeyHandle>> {
        self.select_or_create(name, self.default_key_bits)
    }

    /// Return the pair under `name`
    pub fn select(&self, name: &str) -> Result<Arc<KeyHandle>> {
        self.keys
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::KeyNotFound(name.to_string()))
    }

    /// Store an existing key pair under its own container name
    pub fn insert(&self, handle: KeyHandle) -> Arc<KeyHandle> {
        let handle = Arc::new(handle);
        self.keys
            .write()
            .insert(handle.container_name().to_string(), Arc::clone(&handle));
        tracing::info!(
            "Stored key pair '{}' ({})",
            handle.container_name(),
            handle.fingerprint()
        );
        handle
    }

    /// Remove the pair under `name`; returns whether one existed
    pub fn delete(&self, name: &str) -> bool {
        let removed = self.keys.write().remove(name).is_some();
        if removed {
            tracing::info!("Deleted key pair '{}'", name);
        }
        removed
    }

    /// Portable public half of the pair under `name`
    pub fn export_public(&self, name: &str) -> Result<PublicKeyParams> {
        Ok(self.select(name)?.export_public())
    }

    /// Names of all stored pairs, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.keys.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for KeyContainer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
