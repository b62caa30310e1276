//! # Session Keys
//!
//! A fresh [`SessionKey`] is generated for every encryption call. Only its
//! 32 key bytes travel on the wire (wrapped with the receiver's RSA key); the
//! cipher and the MAC never use those bytes directly.
//!
//! ## Key Separation
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   SESSION KEY → SUB-KEYS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Session Key (32 random bytes, wrapped for the receiver)               │
//! │                          │                                              │
//! │            ┌─────────────┴─────────────┐                                │
//! │            ▼                           ▼                                │
//! │  HKDF-SHA512(                 HKDF-SHA512(                              │
//! │    ikm  = session_key,          ikm  = session_key,                     │
//! │    info = "...cipher-key-v1"    info = "...mac-key-v1"                  │
//! │  ) → 32-byte AES key          ) → 64-byte HMAC key                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both sub-keys and the session key itself are zeroized on drop and never
//! outlive the encrypt/decrypt call that created them.

use hkdf::Hkdf;
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::random::random_array;
use super::{IV_SIZE, MAC_KEY_SIZE, SESSION_KEY_SIZE};
use crate::error::{Error, Result};

/// Domain separation strings for HKDF
pub mod domain {
    /// Info string for the AES-256 sub-key
    pub const CIPHER_KEY: &[u8] = b"hybridcrypt-cipher-key-v1";

    /// Info string for the HMAC-SHA512 sub-key
    pub const MAC_KEY: &[u8] = b"hybridcrypt-mac-key-v1";
}

/// One-time symmetric key material for a single packet or stream
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    key: [u8; SESSION_KEY_SIZE],
    iv: [u8; IV_SIZE],
}

impl SessionKey {
    /// Generate a random 32-byte key and 16-byte IV
    pub fn generate() -> Self {
        Self {
            key: random_array(),
            iv: random_array(),
        }
    }

    /// Rebuild a session key from an unwrapped key and the transmitted IV
    pub fn from_parts(key: &[u8], iv: [u8; IV_SIZE]) -> Result<Self> {
        let key: [u8; SESSION_KEY_SIZE] = key.try_into().map_err(|_| {
            Error::IntegrityFailed(format!(
                "unwrapped session key is {} bytes, expected {}",
                key.len(),
                SESSION_KEY_SIZE
            ))
        })?;
        Ok(Self { key, iv })
    }

    /// Raw key bytes (only ever handed to the RSA wrapping step)
    pub(crate) fn key_bytes(&self) -> &[u8; SESSION_KEY_SIZE] {
        &self.key
    }

    /// The initialization vector
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    /// Derive the independent cipher and MAC keys
    pub fn derive(&self) -> Result<SubKeys> {
        let hkdf = Hkdf::<Sha512>::new(None, &self.key);

        let mut cipher_key = [0u8; SESSION_KEY_SIZE];
        hkdf.expand(domain::CIPHER_KEY, &mut cipher_key)
            .map_err(|_| Error::EncryptionFailed {
                context: "HKDF expansion of cipher key failed".into(),
                source: None,
            })?;

        let mut mac_key = [0u8; MAC_KEY_SIZE];
        hkdf.expand(domain::MAC_KEY, &mut mac_key)
            .map_err(|_| Error::EncryptionFailed {
                context: "HKDF expansion of MAC key failed".into(),
                source: None,
            })?;

        Ok(SubKeys {
            cipher_key,
            mac_key,
        })
    }
}

/// Cipher and MAC keys derived from one [`SessionKey`]
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SubKeys {
    /// AES-256 key
    pub cipher_key: [u8; SESSION_KEY_SIZE],
    /// HMAC-SHA512 key
    pub mac_key: [u8; MAC_KEY_SIZE],
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_fresh() {
        let a = SessionKey::generate();
        let b = SessionKey::generate();
        assert_ne!(a.key_bytes(), b.key_bytes());
        assert_ne!(a.iv(), b.iv());
    }

    #[test]
    fn test_subkeys_are_independent() {
        let session = SessionKey::from_parts(&[7u8; 32], [0u8; 16]).unwrap();
        let keys = session.derive().unwrap();

        assert_ne!(&keys.cipher_key[..], &keys.mac_key[..32]);
        assert_ne!(&keys.cipher_key, session.key_bytes());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = SessionKey::from_parts(&[9u8; 32], [1u8; 16]).unwrap().derive().unwrap();
        let b = SessionKey::from_parts(&[9u8; 32], [2u8; 16]).unwrap().derive().unwrap();

        // The IV plays no part in key derivation
        assert_eq!(a.cipher_key, b.cipher_key);
        assert_eq!(a.mac_key, b.mac_key);
    }

    #[test]
    fn test_wrong_length_is_integrity_failure() {
        let result = SessionKey::from_parts(&[0u8; 31], [0u8; 16]);
        assert!(matches!(result, Err(Error::IntegrityFailed(_))));
    }
}
