//! Streaming decryption.

use std::io::{Read, Seek, SeekFrom, Write};

use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;

use super::{read_chunk, StreamHeader, StreamOptions};
use crate::config::StreamLayout;
use crate::crypto::{
    check_final_padding, compare_digests, fingerprint, verify_signature, CbcDecryptStream,
    KeyHandle, MacAccumulator, BLOCK_SIZE, HMAC_SIZE,
};
use crate::error::{Error, Result};

/// Decrypt a stream addressed to `receiver` and signed by `sender_public`
///
/// The input is read from its current position to its end. The layout in
/// `options` must match the one used to encrypt.
///
/// ## Returns
///
/// - `Ok(true)` - verified; the plaintext has been written to `output`
/// - `Ok(false)` - integrity failure (HMAC mismatch or a session key that
///   does not unwrap); nothing was written
///
/// ## Errors
///
/// - `StreamFormat` if the header is truncated, EskLen does not match the
///   receiver's modulus length, or the ciphertext length is not a positive
///   multiple of the block size
/// - `AuthenticationFailed` if the signature does not verify
/// - `DecryptionFailed` if the verified ciphertext has invalid padding;
///   nothing was written
/// - `Io` on any read or write failure
pub fn decrypt_stream<R, W>(
    receiver: &KeyHandle,
    input: &mut R,
    output: &mut W,
    sender_public: &RsaPublicKey,
    options: &StreamOptions,
) -> Result<bool>
where
    R: Read + Seek,
    W: Write,
{
    let signature_len = sender_public.size();
    let (header, ciphertext_start, ciphertext_len) = match options.layout {
        StreamLayout::Patched => parse_patched(input, signature_len)?,
        StreamLayout::Trailer => parse_trailer(input, signature_len)?,
    };

    if header.encrypted_session_key.len() != receiver.modulus_len() {
        return Err(Error::StreamFormat(format!(
            "encrypted session key is {} bytes, receiver key wraps {}",
            header.encrypted_session_key.len(),
            receiver.modulus_len()
        )));
    }

    tracing::debug!(
        "Decrypting {} stream from {} with '{}' ({} ciphertext bytes)",
        header.data_type,
        fingerprint(sender_public),
        receiver.container_name(),
        ciphertext_len
    );

    let keys = match receiver.unwrap_session_key(&header.encrypted_session_key, header.iv) {
        Ok(session) => session.derive()?,
        Err(Error::IntegrityFailed(reason)) => {
            tracing::warn!("Rejected {} stream: {}", header.data_type, reason);
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    if let Err(e) = verify_signature(sender_public, &header.hmac, &header.signature) {
        tracing::warn!("Rejected {} stream: {}", header.data_type, e);
        return Err(e);
    }

    // Pass 1: authenticate
    let mut mac = MacAccumulator::new(&keys.mac_key);
    mac.update(&header.prefix_bytes()?);

    let chunk_size = options.effective_chunk_size();
    let mut buf = vec![0u8; chunk_size];
    input.seek(SeekFrom::Start(ciphertext_start))?;
    {
        let mut region = input.by_ref().take(ciphertext_len);
        loop {
            let n = read_chunk(&mut region, &mut buf)?;
            mac.update(&buf[..n]);
            if n < buf.len() {
                break;
            }
        }
    }

    if !compare_digests(&mac.finalize(), &header.hmac) {
        tracing::warn!("Rejected {} stream: HMAC mismatch", header.data_type);
        return Ok(false);
    }

    if ciphertext_len == 0 || ciphertext_len % BLOCK_SIZE as u64 != 0 {
        return Err(Error::StreamFormat(format!(
            "ciphertext length {} is not a positive multiple of {}",
            ciphertext_len, BLOCK_SIZE
        )));
    }

    // Final block padding, checked before any plaintext is released
    let block = BLOCK_SIZE as u64;
    let mut previous = header.iv;
    if ciphertext_len > block {
        input.seek(SeekFrom::Start(ciphertext_start + ciphertext_len - 2 * block))?;
        input.read_exact(&mut previous)?;
    } else {
        input.seek(SeekFrom::Start(ciphertext_start))?;
    }
    let mut last = [0u8; BLOCK_SIZE];
    input.read_exact(&mut last)?;
    if let Err(e) = check_final_padding(&keys.cipher_key, &previous, &last) {
        tracing::warn!("Rejected {} stream: {}", header.data_type, e);
        return Err(e);
    }

    // Pass 2: release plaintext
    input.seek(SeekFrom::Start(ciphertext_start))?;
    let mut cipher = CbcDecryptStream::new(&keys.cipher_key, &header.iv);
    let mut plain = Vec::with_capacity(chunk_size + BLOCK_SIZE);
    let mut written = 0u64;
    {
        let mut region = input.by_ref().take(ciphertext_len);
        loop {
            let n = read_chunk(&mut region, &mut buf)?;
            cipher.update(&buf[..n], &mut plain);
            output.write_all(&plain)?;
            written += plain.len() as u64;
            plain.clear();
            if n < buf.len() {
                break;
            }
        }
    }

    cipher.finish(&mut plain)?;
    output.write_all(&plain)?;
    written += plain.len() as u64;
    output.flush()?;

    tracing::debug!("Stream decrypted: {} plaintext bytes", written);
    Ok(true)
}

/// Header first; ciphertext runs to the end of the input
fn parse_patched<R: Read + Seek>(
    input: &mut R,
    signature_len: usize,
) -> Result<(StreamHeader, u64, u64)> {
    let header = StreamHeader::read_from(input, signature_len)?;
    let start = input.stream_position()?;
    let end = input.seek(SeekFrom::End(0))?;
    Ok((header, start, end.saturating_sub(start)))
}

/// Prefix first; HMAC and signature are the last bytes of the input
fn parse_trailer<R: Read + Seek>(
    input: &mut R,
    signature_len: usize,
) -> Result<(StreamHeader, u64, u64)> {
    let mut header = StreamHeader::read_prefix(input)?;
    let start = input.stream_position()?;
    let end = input.seek(SeekFrom::End(0))?;

    let tags_len = (HMAC_SIZE + signature_len) as u64;
    let available = end.saturating_sub(start);
    if available < tags_len {
        return Err(Error::StreamFormat(format!(
            "stream has {} bytes after the header, trailer alone needs {}",
            available, tags_len
        )));
    }

    let ciphertext_len = available - tags_len;
    input.seek(SeekFrom::Start(start + ciphertext_len))?;
    header.read_tags(input, signature_len)?;
    Ok((header, start, ciphertext_len))
}

// ============================================================================
// TESTS
// ============================================================================
