//! Streaming encryption.

use std::io::{Read, Seek, SeekFrom, Write};

use rsa::RsaPublicKey;

use super::{read_chunk, StreamHeader, StreamOptions};
use crate::config::StreamLayout;
use crate::crypto::{fingerprint, KeyHandle, BLOCK_SIZE, HMAC_SIZE};
use crate::error::{Error, Result};
use crate::hybrid::Sealer;

/// Encrypt `input` into `output` in the layout chosen by `options`
///
/// Writing starts at the destination's current position. Returns the
/// number of bytes this call wrote.
///
/// ## Errors
///
/// - `UnseekableDestination` if the patched layout is selected and the
///   destination cannot report or change its position
/// - `EncryptionFailed` if the receiver key cannot wrap a session key or
///   signing fails
/// - `Io` on any read or write failure
///
/// ## Example
///
/// ```ignore
/// let mut out = tempfile::tempfile()?;
/// let options = StreamOptions::default();
/// let written = encrypt_stream(&alice, &mut big_file, &mut out, bob.public_key(), &options)?;
/// ```
pub fn encrypt_stream<R, W>(
    sender: &KeyHandle,
    input: &mut R,
    output: &mut W,
    receiver: &RsaPublicKey,
    options: &StreamOptions,
) -> Result<u64>
where
    R: Read,
    W: Write + Seek,
{
    match options.layout {
        StreamLayout::Patched => encrypt_patched(sender, input, output, receiver, options),
        StreamLayout::Trailer => encrypt_stream_trailer(sender, input, output, receiver, options),
    }
}

/// Encrypt in the trailer layout, which never seeks
///
/// ```text
/// DataType ‖ EskLen ‖ Esk ‖ Iv ‖ Ciphertext ‖ Hmac ‖ Signature
/// ```
pub fn encrypt_stream_trailer<R, W>(
    sender: &KeyHandle,
    input: &mut R,
    output: &mut W,
    receiver: &RsaPublicKey,
    options: &StreamOptions,
) -> Result<u64>
where
    R: Read,
    W: Write,
{
    tracing::debug!(
        "Streaming {} (trailer layout) for {}",
        options.data_type,
        fingerprint(receiver)
    );

    let mut sealer = Sealer::begin(options.data_type, receiver)?;
    output.write_all(sealer.prefix())?;
    let prefix_len = sealer.prefix().len() as u64;

    let chunk_size = options.effective_chunk_size();
    let ciphertext_len = encrypt_chunks(input, &mut sealer, chunk_size, |chunk| {
        output.write_all(chunk)?;
        Ok(())
    })?;

    let header = sealer.seal(sender)?;
    let tags_len = StreamHeader::write_tags(output, &header.hmac, &header.signature)?;
    output.flush()?;

    let total = prefix_len + ciphertext_len + tags_len;
    tracing::debug!("Stream encrypted: {} bytes written", total);
    Ok(total)
}

fn encrypt_patched<R, W>(
    sender: &KeyHandle,
    input: &mut R,
    output: &mut W,
    receiver: &RsaPublicKey,
    options: &StreamOptions,
) -> Result<u64>
where
    R: Read,
    W: Write + Seek,
{
    let start = output
        .stream_position()
        .map_err(Error::UnseekableDestination)?;

    tracing::debug!(
        "Streaming {} (patched layout) for {} at offset {}",
        options.data_type,
        fingerprint(receiver),
        start
    );

    let mut sealer = Sealer::begin(options.data_type, receiver)?;
    let signature_len = sender.modulus_len();

    output.write_all(sealer.prefix())?;
    let prefix_len = sealer.prefix().len() as u64;

    // Placeholders, overwritten once the ciphertext is complete
    output.write_all(&[0u8; HMAC_SIZE])?;
    output.write_all(&vec![0u8; signature_len])?;

    let chunk_size = options.effective_chunk_size();
    let ciphertext_len = encrypt_chunks(input, &mut sealer, chunk_size, |chunk| {
        output.write_all(chunk)?;
        Ok(())
    })?;

    let header = sealer.seal(sender)?;
    if header.signature.len() != signature_len {
        return Err(Error::EncryptionFailed {
            context: format!(
                "signature is {} bytes, reserved slot is {}",
                header.signature.len(),
                signature_len
            ),
            source: None,
        });
    }

    let total = prefix_len + (HMAC_SIZE + signature_len) as u64 + ciphertext_len;

    output
        .seek(SeekFrom::Start(start + prefix_len))
        .map_err(Error::UnseekableDestination)?;
    StreamHeader::write_tags(output, &header.hmac, &header.signature)?;
    output
        .seek(SeekFrom::Start(start + total))
        .map_err(Error::UnseekableDestination)?;
    output.flush()?;

    tracing::debug!("Stream encrypted: {} bytes written", total);
    Ok(total)
}

/// Encrypt `input` chunk by chunk, MACing each piece of ciphertext before
/// handing it to `sink`
///
/// Returns the number of ciphertext bytes produced.
pub(crate) fn encrypt_chunks<R, F>(
    input: &mut R,
    sealer: &mut Sealer,
    chunk_size: usize,
    mut sink: F,
) -> Result<u64>
where
    R: Read + ?Sized,
    F: FnMut(&[u8]) -> Result<()>,
{
    let mut cipher = sealer.cipher();
    let mut buf = vec![0u8; chunk_size];
    let mut out = Vec::with_capacity(chunk_size + BLOCK_SIZE);
    let mut total = 0u64;

    loop {
        let n = read_chunk(input, &mut buf)?;
        if n > 0 {
            cipher.update(&buf[..n], &mut out);
            sealer.absorb(&out);
            sink(&out)?;
            total += out.len() as u64;
            out.clear();
        }
        if n < buf.len() {
            break;
        }
    }

    cipher.finish(&mut out);
    sealer.absorb(&out);
    sink(&out)?;
    total += out.len() as u64;

    Ok(total)
}
