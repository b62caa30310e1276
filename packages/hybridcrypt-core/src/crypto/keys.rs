//! # Key Management
//!
//! RSA key pairs and their portable public halves.
//!
//! ## Key Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          KEY TYPES                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  KeyHandle (RSA private + public)                               │   │
//! │  │  ────────────────────────────────                                │   │
//! │  │                                                                  │   │
//! │  │  Purpose:                                                       │   │
//! │  │  • Unwrapping session keys addressed to us                      │   │
//! │  │  • Signing the HMAC of every packet we send                     │   │
//! │  │                                                                  │   │
//! │  │  Identity:                                                      │   │
//! │  │  • Container name (e.g. "alice")                                │   │
//! │  │  • Fingerprint: hex(SHA-256(modulus)[..8])                      │   │
//! │  │                                                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  PublicKeyParams { modulus, exponent }                          │   │
//! │  │  ──────────────────────────────────────                          │   │
//! │  │                                                                  │   │
//! │  │  Portable form of the public half. Big-endian bytes, hex in    │   │
//! │  │  JSON. Never carries the private exponent.                      │   │
//! │  │                                                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The private half never leaves a [`KeyHandle`]: the only things it does
//! with it are unwrap a session key and sign a digest.

use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::asymmetric;
use super::kdf::SessionKey;
use super::IV_SIZE;
use crate::error::{Error, Result};

/// Smallest accepted RSA modulus, in bits
pub const MIN_KEY_BITS: usize = 1024;

/// Largest accepted RSA modulus, in bits
pub const MAX_KEY_BITS: usize = 16384;

/// Key size used when the caller does not pick one
pub const DEFAULT_KEY_BITS: usize = 4096;

/// Named RSA key pair
///
/// ## Security
///
/// - The private key is zeroized by `rsa` when the handle is dropped
/// - `Debug` output shows the name and fingerprint only
/// - Handles are immutable; concurrent encrypt/decrypt calls may share one
pub struct KeyHandle {
    name: String,
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl KeyHandle {
    /// Generate a fresh key pair of `bits` bits
    ///
    /// ## Errors
    ///
    /// - `InvalidKey` if `bits` is outside `MIN_KEY_BITS..=MAX_KEY_BITS`
    ///   or the primitive library fails to generate the key
    pub fn generate(name: impl Into<String>, bits: usize) -> Result<Self> {
        if !(MIN_KEY_BITS..=MAX_KEY_BITS).contains(&bits) {
            return Err(Error::InvalidKey(format!(
                "key size {} bits outside {}..={}",
                bits, MIN_KEY_BITS, MAX_KEY_BITS
            )));
        }

        let private = RsaPrivateKey::new(&mut rand::rngs::OsRng, bits)
            .map_err(|e| Error::InvalidKey(format!("RSA key generation failed: {}", e)))?;

        Ok(Self::from_private_key(name, private))
    }

    /// Wrap an existing private key
    pub fn from_private_key(name: impl Into<String>, private: RsaPrivateKey) -> Self {
        let public = private.to_public_key();
        Self {
            name: name.into(),
            private,
            public,
        }
    }

    /// The container name this handle was created under
    pub fn container_name(&self) -> &str {
        &self.name
    }

    /// The public half
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// Portable `{modulus, exponent}` form of the public half
    pub fn export_public(&self) -> PublicKeyParams {
        PublicKeyParams::from_public_key(&self.public)
    }

    /// Modulus length in bytes, which is also the signature length
    pub fn modulus_len(&self) -> usize {
        self.public.size()
    }

    /// Short hex fingerprint of the public key, safe to log
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.public)
    }

    /// Recover a session key that was wrapped for this key pair
    ///
    /// Any failure (wrong recipient, tampered bytes, bad length) is an
    /// `IntegrityFailed` error.
    pub fn unwrap_session_key(&self, wrapped: &[u8], iv: [u8; IV_SIZE]) -> Result<SessionKey> {
        asymmetric::unwrap_session_key(&self.private, wrapped, iv)
    }

    /// Sign a 64-byte digest with PKCS#1 v1.5 / SHA-512
    pub fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>> {
        asymmetric::sign_digest(&self.private, digest)
    }
}

impl std::fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyHandle")
            .field("name", &self.name)
            .field("fingerprint", &self.fingerprint())
            .field("bits", &(self.modulus_len() * 8))
            .finish()
    }
}

/// Hex of the first 8 bytes of SHA-256 over the big-endian modulus
pub fn fingerprint(public: &RsaPublicKey) -> String {
    let digest = Sha256::digest(public.n().to_bytes_be());
    hex::encode(&digest[..8])
}

/// Public key parameters that can be shared freely
///
/// Both fields are big-endian unsigned integers, hex-encoded in JSON:
///
/// ```json
/// { "modulus": "c3a1...", "exponent": "010001" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicKeyParams {
    /// RSA modulus `n`
    #[serde(with = "hex_bytes")]
    pub modulus: Vec<u8>,

    /// RSA public exponent `e`
    #[serde(with = "hex_bytes")]
    pub exponent: Vec<u8>,
}

impl PublicKeyParams {
    /// Extract the parameters from a public key
    pub fn from_public_key(public: &RsaPublicKey) -> Self {
        Self {
            modulus: public.n().to_bytes_be(),
            exponent: public.e().to_bytes_be(),
        }
    }

    /// Rebuild the public key
    ///
    /// ## Errors
    ///
    /// - `InvalidKey` if the modulus is smaller than `MIN_KEY_BITS`, larger
    ///   than `MAX_KEY_BITS`, or the exponent is rejected by `rsa`
    pub fn to_public_key(&self) -> Result<RsaPublicKey> {
        let n = BigUint::from_bytes_be(&self.modulus);
        if n.bits() < MIN_KEY_BITS {
            return Err(Error::InvalidKey(format!(
                "modulus is {} bits, minimum is {}",
                n.bits(),
                MIN_KEY_BITS
            )));
        }

        let e = BigUint::from_bytes_be(&self.exponent);
        RsaPublicKey::new_with_max_size(n, e, MAX_KEY_BITS)
            .map_err(|e| Error::InvalidKey(format!("Invalid public key: {}", e)))
    }

    /// Encode as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Parse a portable JSON public key into an RSA public key
///
/// ## Errors
///
/// - `Serialization` if the bytes are not a `PublicKeyParams` document
/// - `InvalidKey` if the parameters do not form a usable key
pub fn import_public(bytes: &[u8]) -> Result<RsaPublicKey> {
    let params: PublicKeyParams = serde_json::from_slice(bytes)?;
    params.to_public_key()
}

/// Serde helper for serializing big-endian integers as hex
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// TESTS
// ============================================================================
