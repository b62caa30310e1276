//! # Error Handling
//!
//! This module provides the error type shared by every part of HybridCrypt Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── EncryptionFailed      - Wrapping, cipher or signing failed    │
//! │  │   ├── DecryptionFailed      - Cipher or padding failed              │
//! │  │   ├── IntegrityFailed       - HMAC mismatch / key unwrap failed     │
//! │  │   └── AuthenticationFailed  - Signature did not verify              │
//! │  │                                                                      │
//! │  ├── Format Errors                                                     │
//! │  │   ├── MalformedPacket       - Packet field missing or invalid       │
//! │  │   ├── StreamFormat          - Truncated/inconsistent stream header  │
//! │  │   └── UnseekableDestination - Patched layout needs random access    │
//! │  │                                                                      │
//! │  ├── Steganography Errors                                              │
//! │  │   └── CarrierTooSmall       - Carrier cannot hold the payload       │
//! │  │                                                                      │
//! │  ├── Key Errors                                                        │
//! │  │   ├── InvalidKey            - Key material unusable                 │
//! │  │   └── KeyNotFound           - No such container                     │
//! │  │                                                                      │
//! │  └── Support Errors                                                    │
//! │      ├── InvalidConfig         - Configuration out of range            │
//! │      ├── Serialization         - JSON encode/decode failed             │
//! │      └── Io                    - Underlying stream I/O failed          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation Policy
//!
//! Integrity and authentication failures are data problems, not transient
//! faults. Nothing in this crate retries them, and no error is ever turned
//! into a partially decrypted result.

use thiserror::Error;

/// Result type alias for HybridCrypt Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed underlying cause kept for diagnostics
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for HybridCrypt Core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Crypto Errors (100-199)
    // ========================================================================
    /// Encryption, key wrapping or signing failed
    #[error("Encryption failed: {context}")]
    EncryptionFailed {
        /// What was being attempted
        context: String,
        /// Primitive-library error, if any
        #[source]
        source: Option<Cause>,
    },

    /// Symmetric decryption or padding removal failed
    #[error("Decryption failed: {context}")]
    DecryptionFailed {
        /// What was being attempted
        context: String,
        /// Primitive-library error, if any
        #[source]
        source: Option<Cause>,
    },

    /// The recomputed HMAC does not match the transmitted one
    #[error("Integrity check failed: {0}")]
    IntegrityFailed(String),

    /// The signature over the HMAC did not verify against the sender key
    #[error("Authentication failed: {context}")]
    AuthenticationFailed {
        /// What was being checked
        context: String,
        /// Primitive-library error, if any
        #[source]
        source: Option<Cause>,
    },

    // ========================================================================
    // Format Errors (200-299)
    // ========================================================================
    /// A packet is missing a required field or carries an invalid one
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    /// A binary stream is truncated or has inconsistent length fields
    #[error("Invalid stream format: {0}")]
    StreamFormat(String),

    /// The destination cannot be repositioned for the patched layout
    #[error("Destination stream is not seekable")]
    UnseekableDestination(#[source] std::io::Error),

    // ========================================================================
    // Steganography Errors (300-399)
    // ========================================================================
    /// The carrier has fewer bytes than the embedding needs
    #[error("Carrier too small: need {needed} bytes, have {available}")]
    CarrierTooSmall {
        /// Carrier bytes required for header and payload
        needed: u64,
        /// Carrier bytes actually available
        available: u64,
    },

    // ========================================================================
    // Key Errors (400-499)
    // ========================================================================
    /// Invalid key format, size or parameters
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// No key pair exists under the given container name
    #[error("Key container not found: {0}")]
    KeyNotFound(String),

    // ========================================================================
    // Support Errors (500-999)
    // ========================================================================
    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error on a caller-supplied stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an `EncryptionFailed` error that keeps the primitive error as its source
    pub fn encryption<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::EncryptionFailed {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a `DecryptionFailed` error that keeps the primitive error as its source
    pub fn decryption<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::DecryptionFailed {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build an `AuthenticationFailed` error without an underlying cause
    pub fn authentication(context: impl Into<String>) -> Self {
        Error::AuthenticationFailed {
            context: context.into(),
            source: None,
        }
    }

    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Crypto
    /// - 200-299: Packet and stream format
    /// - 300-399: Steganography
    /// - 400-499: Keys
    /// - 500-999: Configuration, serialization, I/O
    pub fn code(&self) -> i32 {
        match self {
            // Crypto (100-199)
            Error::EncryptionFailed { .. } => 100,
            Error::DecryptionFailed { .. } => 101,
            Error::IntegrityFailed(_) => 102,
            Error::AuthenticationFailed { .. } => 103,

            // Format (200-299)
            Error::MalformedPacket(_) => 200,
            Error::StreamFormat(_) => 201,
            Error::UnseekableDestination(_) => 202,

            // Steganography (300-399)
            Error::CarrierTooSmall { .. } => 300,

            // Keys (400-499)
            Error::InvalidKey(_) => 400,
            Error::KeyNotFound(_) => 401,

            // Support (500-999)
            Error::InvalidConfig(_) => 500,
            Error::Serialization(_) => 501,
            Error::Io(_) => 900,
        }
    }

    /// True when the error means the data was modified or not sent by the claimed sender
    pub fn is_tamper_evidence(&self) -> bool {
        matches!(
            self,
            Error::IntegrityFailed(_) | Error::AuthenticationFailed { .. }
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
