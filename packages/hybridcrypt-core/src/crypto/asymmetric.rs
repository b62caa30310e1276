//! # Asymmetric Operations
//!
//! Thin wrappers over `rsa` for the four things the engines need:
//!
//! | Operation            | Key     | Scheme                          |
//! |----------------------|---------|---------------------------------|
//! | `wrap_session_key`   | public  | RSAES-PKCS1-v1_5                |
//! | `unwrap_session_key` | private | RSAES-PKCS1-v1_5                |
//! | `sign_digest`        | private | RSASSA-PKCS1-v1_5, SHA-512 OID  |
//! | `verify_signature`   | public  | RSASSA-PKCS1-v1_5, SHA-512 OID  |
//!
//! The signed value is the 64-byte packet HMAC, passed to `rsa` as an
//! already-computed SHA-512-sized digest.

use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::Sha512;
use zeroize::Zeroizing;

use super::kdf::SessionKey;
use super::{HMAC_SIZE, IV_SIZE, SESSION_KEY_SIZE};
use crate::error::{Error, Result};

/// PKCS#1 v1.5 encryption padding overhead
const PKCS1_OVERHEAD: usize = 11;

/// Encrypt the session key for `receiver`
///
/// ## Errors
///
/// - `EncryptionFailed` if the receiver modulus is too small to hold a
///   32-byte key with PKCS#1 v1.5 padding, or `rsa` fails
pub fn wrap_session_key(session: &SessionKey, receiver: &RsaPublicKey) -> Result<Vec<u8>> {
    if receiver.size() < SESSION_KEY_SIZE + PKCS1_OVERHEAD {
        return Err(Error::EncryptionFailed {
            context: format!(
                "receiver modulus of {} bytes cannot wrap a {}-byte session key",
                receiver.size(),
                SESSION_KEY_SIZE
            ),
            source: None,
        });
    }

    receiver
        .encrypt(&mut rand::rngs::OsRng, Pkcs1v15Encrypt, session.key_bytes())
        .map_err(|e| Error::encryption("wrapping session key", e))
}

/// Decrypt a wrapped session key with our private key
pub(crate) fn unwrap_session_key(
    private: &RsaPrivateKey,
    wrapped: &[u8],
    iv: [u8; IV_SIZE],
) -> Result<SessionKey> {
    let key = private
        .decrypt(Pkcs1v15Encrypt, wrapped)
        .map(Zeroizing::new)
        .map_err(|_| Error::IntegrityFailed("session key could not be unwrapped".into()))?;

    SessionKey::from_parts(&key, iv)
}

/// Sign a 64-byte digest
pub(crate) fn sign_digest(private: &RsaPrivateKey, digest: &[u8]) -> Result<Vec<u8>> {
    if digest.len() != HMAC_SIZE {
        return Err(Error::EncryptionFailed {
            context: format!("digest must be {} bytes, got {}", HMAC_SIZE, digest.len()),
            source: None,
        });
    }

    private
        .sign(Pkcs1v15Sign::new::<Sha512>(), digest)
        .map_err(|e| Error::encryption("signing HMAC", e))
}

/// Check `signature` over `digest` against the sender's public key
///
/// ## Errors
///
/// - `AuthenticationFailed` if the signature does not verify, including
///   when it has the wrong length for the sender's modulus
pub fn verify_signature(sender: &RsaPublicKey, digest: &[u8], signature: &[u8]) -> Result<()> {
    sender
        .verify(Pkcs1v15Sign::new::<Sha512>(), digest, signature)
        .map_err(|e| Error::AuthenticationFailed {
            context: "signature does not match sender key".into(),
            source: Some(Box::new(e)),
        })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    static ALICE: Lazy<RsaPrivateKey> =
        Lazy::new(|| RsaPrivateKey::new(&mut rand::rngs::OsRng, 1024).unwrap());
    static BOB: Lazy<RsaPrivateKey> =
        Lazy::new(|| RsaPrivateKey::new(&mut rand::rngs::OsRng, 1024).unwrap());

    #[test]
    fn test_wrap_unwrap() {
        let session = SessionKey::generate();
        let wrapped = wrap_session_key(&session, &BOB.to_public_key()).unwrap();
        assert_eq!(wrapped.len(), 128);

        let unwrapped = unwrap_session_key(&BOB, &wrapped, *session.iv()).unwrap();
        assert_eq!(unwrapped.key_bytes(), session.key_bytes());
        assert_eq!(unwrapped.iv(), session.iv());
    }

    #[test]
    fn test_wrap_is_randomized() {
        let session = SessionKey::generate();
        let a = wrap_session_key(&session, &BOB.to_public_key()).unwrap();
        let b = wrap_session_key(&session, &BOB.to_public_key()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_unwrap_with_wrong_key_is_integrity_failure() {
        let session = SessionKey::generate();
        let wrapped = wrap_session_key(&session, &BOB.to_public_key()).unwrap();

        let result = unwrap_session_key(&ALICE, &wrapped, [0u8; 16]);
        assert!(matches!(result, Err(Error::IntegrityFailed(_))));
    }

    #[test]
    fn test_sign_verify() {
        let digest = [7u8; 64];
        let signature = sign_digest(&ALICE, &digest).unwrap();

        verify_signature(&ALICE.to_public_key(), &digest, &signature).unwrap();

        let mut other = digest;
        other[0] ^= 1;
        assert!(matches!(
            verify_signature(&ALICE.to_public_key(), &other, &signature),
            Err(Error::AuthenticationFailed { .. })
        ));
        assert!(matches!(
            verify_signature(&BOB.to_public_key(), &digest, &signature),
            Err(Error::AuthenticationFailed { .. })
        ));
    }

    #[test]
    fn test_sign_rejects_wrong_digest_size() {
        assert!(matches!(
            sign_digest(&ALICE, &[0u8; 32]),
            Err(Error::EncryptionFailed { .. })
        ));
    }
}
