//! HMAC-SHA512 and constant-time digest comparison.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use subtle::ConstantTimeEq;

use super::HMAC_SIZE;

type HmacSha512 = Hmac<Sha512>;

/// Running HMAC-SHA512 over data that arrives in pieces
///
/// Used by both engines: the whole-buffer engine feeds the header prefix and
/// the ciphertext in two calls, the streaming engine feeds each ciphertext
/// chunk as it is produced or read back.
pub struct MacAccumulator {
    mac: HmacSha512,
}

impl MacAccumulator {
    /// Start a new HMAC with the given key
    pub fn new(key: &[u8]) -> Self {
        // HMAC accepts keys of any length; longer ones are hashed first
        let mac = <HmacSha512 as Mac>::new_from_slice(key)
            .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
        Self { mac }
    }

    /// Absorb more bytes
    pub fn update(&mut self, data: &[u8]) {
        self.mac.update(data);
    }

    /// Finish and return the 64-byte digest
    pub fn finalize(self) -> [u8; HMAC_SIZE] {
        let mut digest = [0u8; HMAC_SIZE];
        digest.copy_from_slice(&self.mac.finalize().into_bytes());
        digest
    }
}

/// One-shot HMAC-SHA512 over the concatenation of `parts`
pub fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> [u8; HMAC_SIZE] {
    let mut acc = MacAccumulator::new(key);
    for part in parts {
        acc.update(part);
    }
    acc.finalize()
}

/// Compare two digests in time independent of where they differ
///
/// Digests of different lengths never match.
pub fn compare_digests(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_size() {
        assert_eq!(hmac_sha512(b"key", &[b"data"]).len(), 64);
    }

    #[test]
    fn test_parts_equal_concatenation() {
        let whole = hmac_sha512(b"key", &[b"hello world"]);
        let split = hmac_sha512(b"key", &[b"hello", b" ", b"world"]);
        assert_eq!(whole, split);
    }

    #[test]
    fn test_key_changes_digest() {
        assert_ne!(
            hmac_sha512(b"key-one", &[b"data"]),
            hmac_sha512(b"key-two", &[b"data"])
        );
    }

    #[test]
    fn test_rfc4231_case_2() {
        let digest = hmac_sha512(b"Jefe", &[b"what do ya want for nothing?"]);
        assert_eq!(
            hex::encode(digest),
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
             9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        );
    }

    #[test]
    fn test_compare_digests() {
        let a = [1u8; 64];
        let mut b = a;
        assert!(compare_digests(&a, &b));

        b[63] ^= 1;
        assert!(!compare_digests(&a, &b));
        assert!(!compare_digests(&a, &a[..32]));
    }
}
