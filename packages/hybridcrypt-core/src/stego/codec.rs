//! Length-prefixed LSB embedding and extraction.

use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};

use super::bits::{glue_group, scatter_group, CARRIER_BYTES_PER_BYTE};
use crate::error::{Error, Result};

/// Payload-equivalent bytes taken by the length prefix
pub const LENGTH_PREFIX_LEN: usize = 8;

/// Carrier bytes taken by the length prefix
pub const HEADER_CARRIER_LEN: u64 = (LENGTH_PREFIX_LEN * CARRIER_BYTES_PER_BYTE) as u64;

/// Payload bytes processed per carrier read
const GROUP_BATCH: usize = 4096;

/// Carrier bytes needed to hide `payload_len` bytes (saturates on overflow)
pub fn required_carrier_len(payload_len: u64) -> u64 {
    payload_len
        .saturating_mul(CARRIER_BYTES_PER_BYTE as u64)
        .saturating_add(HEADER_CARRIER_LEN)
}

/// Hide `payload` in `carrier`, writing the result to `output`
///
/// The carrier is read from its current position. The whole remaining
/// carrier is written out: the embedded region first, then every carrier
/// byte past it unchanged. Returns the number of bytes written.
///
/// ## Errors
///
/// - `CarrierTooSmall` if fewer than `64 + 8 × payload.len()` carrier bytes
///   remain; checked before anything is written
/// - `Io` on any read or write failure
pub fn embed<C, W>(payload: &[u8], carrier: &mut C, output: &mut W) -> Result<u64>
where
    C: Read + Seek,
    W: Write,
{
    let start = carrier.stream_position()?;
    let end = carrier.seek(SeekFrom::End(0))?;
    carrier.seek(SeekFrom::Start(start))?;

    let available = end.saturating_sub(start);
    let needed = required_carrier_len(payload.len() as u64);
    if available < needed {
        return Err(Error::CarrierTooSmall { needed, available });
    }

    tracing::debug!(
        "Embedding {} bytes into carrier of {} bytes",
        payload.len(),
        available
    );

    let prefix = (payload.len() as u64).to_le_bytes();
    let mut buf = Vec::with_capacity(GROUP_BATCH * CARRIER_BYTES_PER_BYTE);
    for batch in std::iter::once(&prefix[..]).chain(payload.chunks(GROUP_BATCH)) {
        buf.resize(batch.len() * CARRIER_BYTES_PER_BYTE, 0);
        read_carrier(carrier, &mut buf)?;

        for (group, byte) in buf.chunks_exact_mut(CARRIER_BYTES_PER_BYTE).zip(batch) {
            scatter_group(group, *byte);
        }
        output.write_all(&buf)?;
    }

    let rest = io::copy(carrier, output)?;
    output.flush()?;
    Ok(needed + rest)
}

/// [`embed`] over in-memory buffers
pub fn embed_bytes(payload: &[u8], carrier: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(carrier.len());
    embed(payload, &mut io::Cursor::new(carrier), &mut output)?;
    Ok(output)
}

/// Recover a payload hidden by [`embed`]
///
/// Reads only the embedded region; trailing carrier bytes are left unread.
///
/// ## Errors
///
/// - `StreamFormat` if the carrier ends before the length prefix or the
///   payload it announces
/// - `Io` on any other read failure
pub fn extract<C: Read>(carrier: &mut C) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_CARRIER_LEN as usize];
    read_carrier(carrier, &mut header)?;

    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    for (byte, group) in prefix.iter_mut().zip(header.chunks_exact(CARRIER_BYTES_PER_BYTE)) {
        *byte = glue_group(group);
    }
    let len = u64::from_le_bytes(prefix);

    tracing::debug!("Extracting {} hidden bytes", len);

    // Grows with what the carrier actually yields, not with the claimed length
    let mut payload = Vec::new();
    let mut buf = vec![0u8; GROUP_BATCH * CARRIER_BYTES_PER_BYTE];
    let mut remaining = len;
    while remaining > 0 {
        let batch = remaining.min(GROUP_BATCH as u64) as usize;
        let group_bytes = &mut buf[..batch * CARRIER_BYTES_PER_BYTE];
        read_carrier(carrier, group_bytes).map_err(|e| match e {
            Error::StreamFormat(_) => Error::StreamFormat(format!(
                "carrier ended after {} of {} hidden bytes",
                len - remaining,
                len
            )),
            other => other,
        })?;

        payload.extend(group_bytes.chunks_exact(CARRIER_BYTES_PER_BYTE).map(glue_group));
        remaining -= batch as u64;
    }

    Ok(payload)
}

fn read_carrier<C: Read + ?Sized>(carrier: &mut C, buf: &mut [u8]) -> Result<()> {
    carrier.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            Error::StreamFormat("carrier ended before the embedded region".into())
        } else {
            Error::Io(e)
        }
    })
}

// ============================================================================
// TESTS
// ============================================================================
