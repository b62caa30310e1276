//! # AES-256-CBC
//!
//! Payload encryption for both engines.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     INCREMENTAL CBC (PKCS7)                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Encrypt:  update(chunk) → whole blocks out, remainder kept (<16 B)    │
//! │            finish()      → remainder padded to one final block         │
//! │                                                                         │
//! │  Decrypt:  update(chunk) → whole blocks decrypted, LAST one held back  │
//! │            finish()      → held block unpadded (1..=16 bytes stripped) │
//! │                                                                         │
//! │  Memory:   bounded by the caller's chunk size + two blocks             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The held-back block is the only place padding can live, so the final
//! block is handled purely by the PKCS7 contract.

use aes::Aes256;
use cbc::cipher::block_padding::{Padding, Pkcs7};
use cbc::cipher::{Block, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use super::{BLOCK_SIZE, IV_SIZE, SESSION_KEY_SIZE};
use crate::error::{Error, Result};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Encrypt a whole buffer
pub fn encrypt_buffer(
    plaintext: &[u8],
    key: &[u8; SESSION_KEY_SIZE],
    iv: &[u8; IV_SIZE],
) -> Vec<u8> {
    Aes256CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt a whole buffer
///
/// ## Errors
///
/// - `DecryptionFailed` if the length is not a positive multiple of the
///   block size or the padding is invalid
pub fn decrypt_buffer(
    ciphertext: &[u8],
    key: &[u8; SESSION_KEY_SIZE],
    iv: &[u8; IV_SIZE],
) -> Result<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(Error::DecryptionFailed {
            context: format!(
                "ciphertext length {} is not a positive multiple of {}",
                ciphertext.len(),
                BLOCK_SIZE
            ),
            source: None,
        });
    }

    Aes256CbcDec::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::DecryptionFailed {
            context: "invalid PKCS7 padding".into(),
            source: None,
        })
}

/// Check the PKCS7 padding of a final ciphertext block, producing no output
///
/// `previous` is the ciphertext block before `last`, or the IV when the
/// ciphertext is a single block.
///
/// ## Errors
///
/// - `DecryptionFailed` if the padding is invalid
pub fn check_final_padding(
    key: &[u8; SESSION_KEY_SIZE],
    previous: &[u8; BLOCK_SIZE],
    last: &[u8; BLOCK_SIZE],
) -> Result<()> {
    let mut block = Block::<Aes256CbcDec>::clone_from_slice(last);
    Aes256CbcDec::new(key.into(), previous.into()).decrypt_block_mut(&mut block);

    let valid = Pkcs7::unpad(&block).is_ok();
    block.iter_mut().for_each(|b| *b = 0);

    if valid {
        Ok(())
    } else {
        Err(Error::DecryptionFailed {
            context: "invalid PKCS7 padding".into(),
            source: None,
        })
    }
}

/// Incremental CBC encryptor
pub struct CbcEncryptStream {
    cipher: Aes256CbcEnc,
    pending: Vec<u8>,
}

impl CbcEncryptStream {
    /// Start encrypting with the given key and IV
    pub fn new(key: &[u8; SESSION_KEY_SIZE], iv: &[u8; IV_SIZE]) -> Self {
        Self {
            cipher: Aes256CbcEnc::new(key.into(), iv.into()),
            pending: Vec::with_capacity(BLOCK_SIZE),
        }
    }

    /// Encrypt every complete block available, appending ciphertext to `out`
    pub fn update(&mut self, input: &[u8], out: &mut Vec<u8>) {
        self.pending.extend_from_slice(input);
        let whole = self.pending.len() - self.pending.len() % BLOCK_SIZE;

        for chunk in self.pending[..whole].chunks_exact(BLOCK_SIZE) {
            let mut block = Block::<Aes256CbcEnc>::clone_from_slice(chunk);
            self.cipher.encrypt_block_mut(&mut block);
            out.extend_from_slice(&block);
        }
        self.pending.drain(..whole);
    }

    /// Pad and encrypt the remainder; always emits exactly one block
    pub fn finish(mut self, out: &mut Vec<u8>) {
        let mut block = Block::<Aes256CbcEnc>::default();
        let pos = self.pending.len();
        block[..pos].copy_from_slice(&self.pending);
        Pkcs7::pad(&mut block, pos);

        self.cipher.encrypt_block_mut(&mut block);
        out.extend_from_slice(&block);
    }
}

/// Incremental CBC decryptor with a one-block holdback
pub struct CbcDecryptStream {
    cipher: Aes256CbcDec,
    pending: Vec<u8>,
    held: Option<Block<Aes256CbcDec>>,
}

impl CbcDecryptStream {
    /// Start decrypting with the given key and IV
    pub fn new(key: &[u8; SESSION_KEY_SIZE], iv: &[u8; IV_SIZE]) -> Self {
        Self {
            cipher: Aes256CbcDec::new(key.into(), iv.into()),
            pending: Vec::with_capacity(BLOCK_SIZE),
            held: None,
        }
    }

    /// Decrypt complete blocks, appending all but the newest one to `out`
    pub fn update(&mut self, input: &[u8], out: &mut Vec<u8>) {
        self.pending.extend_from_slice(input);
        let whole = self.pending.len() - self.pending.len() % BLOCK_SIZE;

        for chunk in self.pending[..whole].chunks_exact(BLOCK_SIZE) {
            let mut block = Block::<Aes256CbcDec>::clone_from_slice(chunk);
            self.cipher.decrypt_block_mut(&mut block);
            if let Some(previous) = self.held.replace(block) {
                out.extend_from_slice(&previous);
            }
        }
        self.pending.drain(..whole);
    }

    /// Strip the padding from the held block and append what remains
    ///
    /// ## Errors
    ///
    /// - `DecryptionFailed` if input ended mid-block, no block was seen,
    ///   or the padding is invalid
    pub fn finish(self, out: &mut Vec<u8>) -> Result<()> {
        if !self.pending.is_empty() {
            return Err(Error::DecryptionFailed {
                context: format!("{} trailing bytes do not form a block", self.pending.len()),
                source: None,
            });
        }

        let last = self.held.ok_or_else(|| Error::DecryptionFailed {
            context: "no ciphertext blocks".into(),
            source: None,
        })?;

        let data = Pkcs7::unpad(&last).map_err(|_| Error::DecryptionFailed {
            context: "invalid PKCS7 padding".into(),
            source: None,
        })?;
        out.extend_from_slice(data);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x11; 32];
    const IV: [u8; 16] = [0x22; 16];

    fn stream_encrypt(data: &[u8], chunk: usize) -> Vec<u8> {
        let mut enc = CbcEncryptStream::new(&KEY, &IV);
        let mut out = Vec::new();
        for piece in data.chunks(chunk) {
            enc.update(piece, &mut out);
        }
        enc.finish(&mut out);
        out
    }

    fn stream_decrypt(data: &[u8], chunk: usize) -> Result<Vec<u8>> {
        let mut dec = CbcDecryptStream::new(&KEY, &IV);
        let mut out = Vec::new();
        for piece in data.chunks(chunk) {
            dec.update(piece, &mut out);
        }
        dec.finish(&mut out)?;
        Ok(out)
    }

    #[test]
    fn test_whole_buffer_roundtrip() {
        let plaintext = b"The quick brown fox jumps over the lazy dog";
        let ciphertext = encrypt_buffer(plaintext, &KEY, &IV);

        assert_eq!(ciphertext.len(), 48);
        assert_eq!(decrypt_buffer(&ciphertext, &KEY, &IV).unwrap(), plaintext);
    }

    #[test]
    fn test_empty_plaintext_is_one_block() {
        let ciphertext = encrypt_buffer(b"", &KEY, &IV);
        assert_eq!(ciphertext.len(), 16);
        assert!(decrypt_buffer(&ciphertext, &KEY, &IV).unwrap().is_empty());
    }

    #[test]
    fn test_exact_block_gets_full_padding_block() {
        let ciphertext = encrypt_buffer(&[0xAB; 32], &KEY, &IV);
        assert_eq!(ciphertext.len(), 48);
    }

    #[test]
    fn test_stream_matches_whole_buffer() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i * 7) as u8).collect();
        let expected = encrypt_buffer(&data, &KEY, &IV);

        for chunk in [1, 5, 16, 17, 64, 999, 4096] {
            assert_eq!(stream_encrypt(&data, chunk), expected, "chunk {}", chunk);
            assert_eq!(stream_decrypt(&expected, chunk).unwrap(), data, "chunk {}", chunk);
        }
    }

    #[test]
    fn test_wrong_key_fails_or_differs() {
        let ciphertext = encrypt_buffer(b"secret message", &KEY, &IV);
        match decrypt_buffer(&ciphertext, &[0x33; 32], &IV) {
            Ok(plain) => assert_ne!(plain, b"secret message"),
            Err(e) => assert!(matches!(e, Error::DecryptionFailed { .. })),
        }
    }

    #[test]
    fn test_final_padding_check() {
        let ciphertext = encrypt_buffer(&[0x5A; 40], &KEY, &IV);
        let last: [u8; 16] = ciphertext[32..].try_into().unwrap();
        let previous: [u8; 16] = ciphertext[16..32].try_into().unwrap();
        check_final_padding(&KEY, &previous, &last).unwrap();

        let single = encrypt_buffer(b"one block", &KEY, &IV);
        let single: [u8; 16] = single[..].try_into().unwrap();
        check_final_padding(&KEY, &IV, &single).unwrap();

        // A full block of plaintext zeros, encrypted without padding
        let mut enc = CbcEncryptStream::new(&KEY, &IV);
        let mut unpadded = Vec::new();
        enc.update(&[0u8; 16], &mut unpadded);
        let unpadded: [u8; 16] = unpadded[..].try_into().unwrap();
        assert!(matches!(
            check_final_padding(&KEY, &IV, &unpadded),
            Err(Error::DecryptionFailed { .. })
        ));
    }

    #[test]
    fn test_bad_lengths() {
        assert!(matches!(
            decrypt_buffer(&[], &KEY, &IV),
            Err(Error::DecryptionFailed { .. })
        ));
        assert!(matches!(
            decrypt_buffer(&[0u8; 17], &KEY, &IV),
            Err(Error::DecryptionFailed { .. })
        ));
        assert!(matches!(
            stream_decrypt(&[0u8; 17], 8),
            Err(Error::DecryptionFailed { .. })
        ));
        assert!(matches!(
            stream_decrypt(&[], 8),
            Err(Error::DecryptionFailed { .. })
        ));
    }
}
