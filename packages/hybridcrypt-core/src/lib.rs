//! # HybridCrypt Core
//!
//! Hybrid RSA + AES encryption for messages, files and streams, with a
//! least-significant-bit steganographic carrier codec.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      HYBRIDCRYPT CORE MODULES                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │   Hybrid    │  │   Stream    │  │    Stego    │  │  Container   │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - encrypt   │  │ - patched   │  │ - embed     │  │ - named keys │   │
//! │  │ - decrypt   │  │ - trailer   │  │ - extract   │  │ - export     │   │
//! │  │ - reader    │  │ - two-pass  │  │ - conceal   │  │ - import     │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         │                │                │                │           │
//! │         └────────────────┴───────┬────────┴────────────────┘           │
//! │                                  │                                      │
//! │  ┌─────────────┐  ┌──────────────┴──┐  ┌─────────────────────────────┐ │
//! │  │   Packet    │  │     Crypto      │  │           Config            │ │
//! │  │             │  │                 │  │                             │ │
//! │  │ - DataType  │  │ - RSA wrap/sign │  │ - key size                  │ │
//! │  │ - builder   │  │ - AES-256-CBC   │  │ - chunk size                │ │
//! │  │ - binary    │  │ - HMAC-SHA512   │  │ - stream layout             │ │
//! │  └─────────────┘  └─────────────────┘  └─────────────────────────────┘ │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error type for the entire library
//! - [`config`] - Tunables and stream layout selection
//! - [`crypto`] - Primitive adapters (RSA, AES-CBC, HMAC, HKDF, randomness)
//! - [`container`] - Named key pairs
//! - [`packet`] - In-memory packet and its encodings
//! - [`hybrid`] - Whole-buffer encrypt/decrypt
//! - [`stream`] - Bounded-memory encrypt/decrypt over `Read`/`Write`
//! - [`stego`] - LSB carrier codec and encrypt-then-hide
//!
//! ## Security Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SECURITY PROPERTIES                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Confidentiality                                                        │
//! │  ───────────────                                                        │
//! │  A fresh 256-bit session key per call, wrapped with the receiver's     │
//! │  RSA key. Only the receiver's private key recovers it.                 │
//! │                                                                         │
//! │  Integrity                                                              │
//! │  ─────────                                                              │
//! │  HMAC-SHA512 over every header field and the ciphertext, keyed with    │
//! │  a sub-key independent of the cipher key. Checked in constant time     │
//! │  before any plaintext is produced.                                     │
//! │                                                                         │
//! │  Authenticity                                                           │
//! │  ────────────                                                           │
//! │  The HMAC is signed with the sender's RSA key; verification needs      │
//! │  only the sender's public key.                                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use hybridcrypt_core::{decrypt, encrypt, DataType, KeyContainer};
//!
//! let keys = KeyContainer::new();
//! let alice = keys.select_or_create("alice", 2048)?;
//! let bob = keys.select_or_create("bob", 2048)?;
//!
//! let packet = encrypt(&alice, DataType::Message, b"hello", bob.public_key())?;
//! let plain = decrypt(&bob, &packet, alice.public_key())?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod container;
pub mod crypto;
pub mod error;
pub mod hybrid;
pub mod packet;
pub mod stego;
pub mod stream;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::{CryptoConfig, StreamLayout};
pub use container::KeyContainer;
pub use crypto::{import_public, KeyHandle, PublicKeyParams};
pub use error::{Error, Result};
pub use hybrid::{decrypt, decrypt_with_options, encrypt, encrypt_reader, DecryptOptions};
pub use packet::{DataType, EncryptedPacket, EncryptedPacketBuilder};
pub use stego::{conceal, embed, embed_bytes, extract, glue_bits, reveal};
pub use stream::{decrypt_stream, encrypt_stream, StreamHeader, StreamOptions};

/// The `rsa` public key type used throughout the API
pub use rsa::RsaPublicKey;

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of HybridCrypt Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns build information for debugging
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        target: std::env::consts::OS,
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
    }
}

/// Build information for debugging
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Crate version
    pub version: &'static str,
    /// Target operating system
    pub target: &'static str,
    /// Build profile (debug/release)
    pub profile: &'static str,
}

// ============================================================================
// TESTS
// ============================================================================
