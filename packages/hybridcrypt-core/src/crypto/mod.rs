//! # Cryptography Module
//!
//! Adapters over the primitive crates used by the packet and stream engines.
//! Nothing in here implements cipher, hash or signature mathematics.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    PER-CALL KEY MATERIAL                        │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  OsRng ──► Session Key (32 B) + IV (16 B)                      │   │
//! │  │                 │                                               │   │
//! │  │       ┌─────────┼──────────────────────┐                        │   │
//! │  │       ▼         ▼                      ▼                        │   │
//! │  │  RSA wrap   HKDF → AES key        HKDF → HMAC key               │   │
//! │  │  (receiver)   (32 B)                 (64 B)                     │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 ENCRYPT-THEN-MAC-THEN-SIGN                      │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  1. Ciphertext = AES-256-CBC(aes_key, iv, plaintext) + PKCS7   │   │
//! │  │  2. Hmac       = HMAC-SHA512(mac_key, header ‖ ciphertext)     │   │
//! │  │  3. Signature  = RSA-PKCS1v15-SHA512(sender_private, Hmac)     │   │
//! │  │                                                                 │   │
//! │  │  Decrypt checks the MAC (constant time) and the signature      │   │
//! │  │  before a single plaintext byte is produced.                   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices
//!
//! | Algorithm | Purpose | Crate |
//! |-----------|---------|-------|
//! | RSAES-PKCS1-v1_5 | Session key wrapping | `rsa` |
//! | RSASSA-PKCS1-v1_5 / SHA-512 | Signing the HMAC | `rsa`, `sha2` |
//! | AES-256-CBC + PKCS7 | Payload | `aes`, `cbc` |
//! | HMAC-SHA512 | Integrity | `hmac`, `sha2` |
//! | HKDF-SHA512 | Cipher/MAC key separation | `hkdf` |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: session and derived keys are zeroized when dropped
//! 2. **Constant-Time Comparison**: MACs are compared with `subtle`
//! 3. **Secure Random**: `rand::rngs::OsRng` for every key and IV
//! 4. **No Key Reuse**: every encrypt call draws a new session key and IV

mod asymmetric;
mod hashing;
mod kdf;
mod keys;
mod random;
mod symmetric;

pub use asymmetric::{verify_signature, wrap_session_key};
pub use hashing::{compare_digests, hmac_sha512, MacAccumulator};
pub use kdf::{domain, SessionKey, SubKeys};
pub use keys::{
    fingerprint, import_public, KeyHandle, PublicKeyParams, DEFAULT_KEY_BITS, MAX_KEY_BITS,
    MIN_KEY_BITS,
};
pub use random::{fill_random, random_array, random_bytes};
pub use symmetric::{
    check_final_padding, decrypt_buffer, encrypt_buffer, CbcDecryptStream, CbcEncryptStream,
};

/// Size of the session key and of the derived AES key in bytes (256 bits)
pub const SESSION_KEY_SIZE: usize = 32;

/// Size of the CBC initialization vector in bytes
pub const IV_SIZE: usize = 16;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Size of an HMAC-SHA512 digest in bytes
pub const HMAC_SIZE: usize = 64;

/// Size of the derived HMAC key in bytes
pub const MAC_KEY_SIZE: usize = 64;
