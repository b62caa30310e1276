//! Encrypt-then-hide.
//!
//! The message goes through the streaming engine with
//! `DataType::Steganography`, and the resulting stream bytes are what get
//! embedded. Revealing reverses both steps; the carrier alone never yields
//! plaintext without the receiver's key and the sender's signature.

use std::io::{Cursor, Read, Seek, Write};

use rsa::RsaPublicKey;

use super::codec::{embed, extract};
use crate::crypto::KeyHandle;
use crate::error::{Error, Result};
use crate::packet::DataType;
use crate::stream::{decrypt_stream, encrypt_stream, StreamOptions};

/// Encrypt `message` for `receiver` and hide it in `carrier`
///
/// Returns the number of bytes written to `output` (the full carrier).
///
/// ## Errors
///
/// - `CarrierTooSmall` if the carrier cannot hold the encrypted stream
/// - Any error of [`encrypt_stream`] or [`embed`]
pub fn conceal<C, W>(
    sender: &KeyHandle,
    message: &[u8],
    receiver: &RsaPublicKey,
    carrier: &mut C,
    output: &mut W,
    options: &StreamOptions,
) -> Result<u64>
where
    C: Read + Seek,
    W: Write,
{
    let options = options.with_data_type(DataType::Steganography);

    let mut sealed = Cursor::new(Vec::new());
    let mut reader = message;
    encrypt_stream(sender, &mut reader, &mut sealed, receiver, &options)?;

    tracing::debug!(
        "Concealing {} byte message as {} byte sealed payload",
        message.len(),
        sealed.get_ref().len()
    );

    embed(sealed.get_ref(), carrier, output)
}

/// Extract and decrypt a message hidden by [`conceal`]
///
/// ## Errors
///
/// - `IntegrityFailed` if the hidden payload fails HMAC verification
/// - `AuthenticationFailed` if it was not signed by `sender_public`
/// - `StreamFormat` if the carrier holds no well-formed payload
pub fn reveal<C: Read>(
    receiver: &KeyHandle,
    carrier: &mut C,
    sender_public: &RsaPublicKey,
    options: &StreamOptions,
) -> Result<Vec<u8>> {
    let payload = extract(carrier)?;

    let mut message = Vec::new();
    if !decrypt_stream(receiver, &mut Cursor::new(payload), &mut message, sender_public, options)? {
        return Err(Error::IntegrityFailed(
            "hidden payload failed HMAC verification".into(),
        ));
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamLayout;
    use crate::stego::required_carrier_len;
    use once_cell::sync::Lazy;

    static ALICE: Lazy<KeyHandle> = Lazy::new(|| KeyHandle::generate("alice", 1024).unwrap());
    static BOB: Lazy<KeyHandle> = Lazy::new(|| KeyHandle::generate("bob", 1024).unwrap());

    fn cover(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 200) as u8).collect()
    }

    #[test]
    fn test_conceal_reveal() {
        let options = StreamOptions::default();
        let carrier = cover(8192);

        let mut stego = Vec::new();
        let written = conceal(
            &ALICE,
            b"meet at noon",
            BOB.public_key(),
            &mut Cursor::new(&carrier),
            &mut stego,
            &options,
        )
        .unwrap();
        assert_eq!(written as usize, carrier.len());

        let message = reveal(&BOB, &mut Cursor::new(&stego), ALICE.public_key(), &options).unwrap();
        assert_eq!(message, b"meet at noon");
    }

    #[test]
    fn test_hidden_stream_is_tagged() {
        let options = StreamOptions::default().with_layout(StreamLayout::Trailer);
        let mut stego = Vec::new();
        conceal(
            &ALICE,
            b"x",
            BOB.public_key(),
            &mut Cursor::new(cover(8192)),
            &mut stego,
            &options,
        )
        .unwrap();

        let payload = extract(&mut Cursor::new(&stego)).unwrap();
        assert_eq!(payload[0], DataType::Steganography as u8);
    }

    #[test]
    fn test_small_carrier() {
        // Sealed stream for an empty message: 147 prefix + 192 tags + 16 ciphertext
        let needed = required_carrier_len(147 + 192 + 16);
        let result = conceal(
            &ALICE,
            b"",
            BOB.public_key(),
            &mut Cursor::new(cover(needed as usize - 1)),
            &mut Vec::new(),
            &StreamOptions::default(),
        );
        assert!(matches!(result, Err(Error::CarrierTooSmall { .. })));
    }

    #[test]
    fn test_flipped_payload_bit_is_integrity_failure() {
        let options = StreamOptions::default();
        let mut stego = Vec::new();
        conceal(
            &ALICE,
            b"do not touch",
            BOB.public_key(),
            &mut Cursor::new(cover(8192)),
            &mut stego,
            &options,
        )
        .unwrap();

        // Last ciphertext bit; the sealed payload is 147 + 192 + 16 bytes
        let last_bit = required_carrier_len(147 + 192 + 16) as usize - 1;
        stego[last_bit] ^= 1;

        assert!(matches!(
            reveal(&BOB, &mut Cursor::new(&stego), ALICE.public_key(), &options),
            Err(Error::IntegrityFailed(_))
        ));
    }
}
