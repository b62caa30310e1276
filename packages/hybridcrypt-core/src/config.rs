//! # Configuration
//!
//! Tunables shared by the key container and the streaming engine.
//!
//! ```json
//! {
//!   "default_key_bits": 4096,
//!   "stream_chunk_size": 65536,
//!   "stream_layout": "patched"
//! }
//! ```
//!
//! Every field is optional in JSON; missing fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::crypto::{DEFAULT_KEY_BITS, MAX_KEY_BITS, MIN_KEY_BITS};
use crate::error::{Error, Result};

/// Default plaintext/ciphertext chunk size for streaming (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Where the streaming engine puts the HMAC and signature
///
/// ```text
/// Patched: DataType ‖ EskLen ‖ Esk ‖ Iv ‖ Hmac ‖ Signature ‖ Ciphertext
/// Trailer: DataType ‖ EskLen ‖ Esk ‖ Iv ‖ Ciphertext ‖ Hmac ‖ Signature
/// ```
///
/// `Patched` reserves zeroed slots and seeks back to fill them, so the
/// destination must be seekable. `Trailer` appends them and works with any
/// writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamLayout {
    /// Fixed header slots patched after the ciphertext is written
    #[default]
    Patched,
    /// HMAC and signature appended after the ciphertext
    Trailer,
}

/// Configuration for the crypto engines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// RSA key size used by `KeyContainer` when none is given
    pub default_key_bits: usize,
    /// Bytes read from the source per streaming step
    pub stream_chunk_size: usize,
    /// Layout produced by streaming encryption
    pub stream_layout: StreamLayout,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            default_key_bits: DEFAULT_KEY_BITS,
            stream_chunk_size: DEFAULT_CHUNK_SIZE,
            stream_layout: StreamLayout::Patched,
        }
    }
}

impl CryptoConfig {
    /// Check that every value is in range
    ///
    /// ## Errors
    ///
    /// - `InvalidConfig` naming the first offending field
    pub fn validate(&self) -> Result<()> {
        if !(MIN_KEY_BITS..=MAX_KEY_BITS).contains(&self.default_key_bits) {
            return Err(Error::InvalidConfig(format!(
                "default_key_bits must be within {}..={}, got {}",
                MIN_KEY_BITS, MAX_KEY_BITS, self.default_key_bits
            )));
        }
        if self.stream_chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "stream_chunk_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Encode as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// TESTS
// ============================================================================
