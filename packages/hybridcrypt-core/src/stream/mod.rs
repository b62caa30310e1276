//! # Streaming Engine
//!
//! Hybrid encryption for payloads too large to hold in memory.
//!
//! ## Encrypt (patched layout)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     SINGLE-PASS ENCRYPT                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  1. write prefix      DataType ‖ EskLen ‖ Esk ‖ Iv                     │
//! │  2. reserve slots     Hmac = 0⁶⁴ ‖ Signature = 0ᴺ                      │
//! │  3. for each chunk    AES-CBC → ciphertext ──► destination             │
//! │                                        └────► HMAC accumulator         │
//! │  4. finalize          sign HMAC, seek back, overwrite the slots        │
//! │                                                                         │
//! │  Memory: one chunk, independent of payload size                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An interrupted encrypt leaves zeroed slots behind; such output never
//! decrypts, since neither an all-zero signature nor an all-zero HMAC
//! verifies.
//!
//! ## Decrypt
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     TWO-PASS DECRYPT                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  parse header ──► unwrap session key ──► verify signature over Hmac    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  pass 1: HMAC over prefix ‖ ciphertext     mismatch → Ok(false)        │
//! │       │                                                                 │
//! │       ▼  (seek back to ciphertext start)                                │
//! │  pass 2: AES-CBC decrypt ──► destination   last block unpadded         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No plaintext byte reaches the destination before pass 1 succeeds.

mod decrypt;
mod encrypt;
mod header;

pub use decrypt::decrypt_stream;
pub use encrypt::{encrypt_stream, encrypt_stream_trailer};
pub use header::StreamHeader;

pub(crate) use encrypt::encrypt_chunks;

use std::io::{ErrorKind, Read};

use crate::config::{CryptoConfig, StreamLayout, DEFAULT_CHUNK_SIZE};
use crate::packet::DataType;

/// Per-call settings for the streaming engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    /// DataType written into the header
    pub data_type: DataType,
    /// Where the HMAC and signature go
    pub layout: StreamLayout,
    /// Bytes read from the source per step
    pub chunk_size: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            data_type: DataType::File,
            layout: StreamLayout::Patched,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl From<&CryptoConfig> for StreamOptions {
    fn from(config: &CryptoConfig) -> Self {
        Self {
            layout: config.stream_layout,
            chunk_size: config.stream_chunk_size,
            ..Self::default()
        }
    }
}

impl StreamOptions {
    /// Override the DataType
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Override the layout
    pub fn with_layout(mut self, layout: StreamLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Override the chunk size (zero is treated as one byte)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub(crate) fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}

/// Fill `buf` from `reader` until it is full or the reader is exhausted
///
/// Returns the number of bytes read; less than `buf.len()` means EOF.
pub(crate) fn read_chunk<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = buf.len().min(3).min(self.0.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_read_chunk_fills_across_short_reads() {
        let data = [1u8; 20];
        let mut reader = Trickle(&data);
        let mut buf = [0u8; 8];

        assert_eq!(read_chunk(&mut reader, &mut buf).unwrap(), 8);
        assert_eq!(read_chunk(&mut reader, &mut buf).unwrap(), 8);
        assert_eq!(read_chunk(&mut reader, &mut buf).unwrap(), 4);
        assert_eq!(read_chunk(&mut reader, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_options_from_config() {
        let config = CryptoConfig {
            stream_layout: StreamLayout::Trailer,
            stream_chunk_size: 1024,
            ..Default::default()
        };
        let options = StreamOptions::from(&config).with_data_type(DataType::Message);

        assert_eq!(options.layout, StreamLayout::Trailer);
        assert_eq!(options.chunk_size, 1024);
        assert_eq!(options.data_type, DataType::Message);
        assert_eq!(StreamOptions::default().data_type, DataType::File);
        assert_eq!(StreamOptions::default().with_chunk_size(0).effective_chunk_size(), 1);
    }
}
