//! Binary stream header.
//!
//! ```text
//! ┌──────────┬────────────┬───────────────┬──────┬──────┬───────────┐
//! │ DataType │ EskLen     │ EncSessionKey │ Iv   │ Hmac │ Signature │
//! │ 1 byte   │ 2 bytes LE │ EskLen bytes  │ 16 B │ 64 B │ N bytes   │
//! └──────────┴────────────┴───────────────┴──────┴──────┴───────────┘
//!  ◄──────────────── prefix ─────────────────────────►◄─── tags ───►
//! ```
//!
//! `N` is the sender's RSA modulus length and is not stored; the reader
//! must know the sender key. In the trailer layout the tags follow the
//! ciphertext instead of the prefix.

use std::io::{ErrorKind, Read, Write};

use crate::crypto::{HMAC_SIZE, IV_SIZE};
use crate::error::{Error, Result};
use crate::packet::DataType;

/// Width of the DataType and EskLen fields together
const FIXED_PREFIX_LEN: usize = 1 + 2;

/// Parsed or to-be-written stream header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Payload kind
    pub data_type: DataType,
    /// Session key wrapped for the receiver
    pub encrypted_session_key: Vec<u8>,
    /// CBC initialization vector
    pub iv: [u8; IV_SIZE],
    /// HMAC over prefix and ciphertext (zero until patched)
    pub hmac: [u8; HMAC_SIZE],
    /// Sender signature over `hmac` (empty until known)
    pub signature: Vec<u8>,
}

impl StreamHeader {
    /// Header with empty tags, ready for the prefix to be written
    pub fn new(data_type: DataType, encrypted_session_key: Vec<u8>, iv: [u8; IV_SIZE]) -> Self {
        Self {
            data_type,
            encrypted_session_key,
            iv,
            hmac: [0u8; HMAC_SIZE],
            signature: Vec::new(),
        }
    }

    /// Bytes taken by DataType, EskLen, EncSessionKey and Iv
    pub fn prefix_len(&self) -> usize {
        FIXED_PREFIX_LEN + self.encrypted_session_key.len() + IV_SIZE
    }

    /// Bytes taken by the whole header for a given signature length
    pub fn header_len(&self, signature_len: usize) -> usize {
        self.prefix_len() + HMAC_SIZE + signature_len
    }

    /// Encode the prefix; these exact bytes also open the HMAC input
    pub fn prefix_bytes(&self) -> Result<Vec<u8>> {
        let esk_len = u16::try_from(self.encrypted_session_key.len()).map_err(|_| {
            Error::EncryptionFailed {
                context: format!(
                    "encrypted session key of {} bytes does not fit a 16-bit length",
                    self.encrypted_session_key.len()
                ),
                source: None,
            }
        })?;

        let mut bytes = Vec::with_capacity(self.prefix_len());
        bytes.push(self.data_type as u8);
        bytes.extend_from_slice(&esk_len.to_le_bytes());
        bytes.extend_from_slice(&self.encrypted_session_key);
        bytes.extend_from_slice(&self.iv);
        Ok(bytes)
    }

    /// Write the prefix, returning the number of bytes written
    pub fn write_prefix<W: Write>(&self, writer: &mut W) -> Result<u64> {
        let bytes = self.prefix_bytes()?;
        writer.write_all(&bytes)?;
        Ok(bytes.len() as u64)
    }

    /// Write an HMAC followed by a signature, returning the bytes written
    pub fn write_tags<W: Write>(
        writer: &mut W,
        hmac: &[u8; HMAC_SIZE],
        signature: &[u8],
    ) -> Result<u64> {
        writer.write_all(hmac)?;
        writer.write_all(signature)?;
        Ok((HMAC_SIZE + signature.len()) as u64)
    }

    /// Write prefix and tags in patched order
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<u64> {
        let prefix = self.write_prefix(writer)?;
        let tags = Self::write_tags(writer, &self.hmac, &self.signature)?;
        Ok(prefix + tags)
    }

    /// Read DataType, EskLen, EncSessionKey and Iv
    ///
    /// ## Errors
    ///
    /// - `StreamFormat` if the stream ends early, the DataType tag is
    ///   unknown, or EskLen is zero
    pub fn read_prefix<R: Read>(reader: &mut R) -> Result<Self> {
        let mut fixed = [0u8; FIXED_PREFIX_LEN];
        read_field(reader, &mut fixed, "data type and key length")?;

        let data_type = DataType::try_from(fixed[0])
            .map_err(|_| Error::StreamFormat(format!("unknown data type tag {}", fixed[0])))?;

        let esk_len = u16::from_le_bytes([fixed[1], fixed[2]]) as usize;
        if esk_len == 0 {
            return Err(Error::StreamFormat("encrypted session key length is zero".into()));
        }

        let mut encrypted_session_key = vec![0u8; esk_len];
        read_field(reader, &mut encrypted_session_key, "encrypted session key")?;

        let mut iv = [0u8; IV_SIZE];
        read_field(reader, &mut iv, "IV")?;

        Ok(Self::new(data_type, encrypted_session_key, iv))
    }

    /// Read the HMAC and a signature of `signature_len` bytes into `self`
    pub fn read_tags<R: Read>(&mut self, reader: &mut R, signature_len: usize) -> Result<()> {
        read_field(reader, &mut self.hmac, "HMAC")?;

        let mut signature = vec![0u8; signature_len];
        read_field(reader, &mut signature, "signature")?;
        self.signature = signature;
        Ok(())
    }

    /// Read a complete patched-layout header
    pub fn read_from<R: Read>(reader: &mut R, signature_len: usize) -> Result<Self> {
        let mut header = Self::read_prefix(reader)?;
        header.read_tags(reader, signature_len)?;
        Ok(header)
    }
}

/// `read_exact` with truncation reported as a format error
fn read_field<R: Read>(reader: &mut R, buf: &mut [u8], field: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            Error::StreamFormat(format!("stream truncated while reading {}", field))
        } else {
            Error::Io(e)
        }
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> StreamHeader {
        let mut header = StreamHeader::new(DataType::File, vec![0xEE; 128], [0x11; 16]);
        header.hmac = [0x22; 64];
        header.signature = vec![0x33; 128];
        header
    }

    #[test]
    fn test_layout_is_byte_exact() {
        let header = sample();
        let mut out = Vec::new();
        let written = header.write_to(&mut out).unwrap();

        assert_eq!(written as usize, out.len());
        assert_eq!(out.len(), header.header_len(128));
        assert_eq!(out.len(), 1 + 2 + 128 + 16 + 64 + 128);

        assert_eq!(out[0], 1);
        assert_eq!(&out[1..3], &[128, 0]);
        assert_eq!(&out[3..131], &[0xEE; 128][..]);
        assert_eq!(&out[131..147], &[0x11; 16]);
        assert_eq!(&out[147..211], &[0x22; 64][..]);
        assert_eq!(&out[211..], &[0x33; 128][..]);
    }

    #[test]
    fn test_read_back() {
        let header = sample();
        let mut out = Vec::new();
        header.write_to(&mut out).unwrap();
        out.extend_from_slice(b"ciphertext follows");

        let mut cursor = Cursor::new(out);
        let parsed = StreamHeader::read_from(&mut cursor, 128).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(cursor.position() as usize, header.header_len(128));
    }

    #[test]
    fn test_truncated_stream() {
        let mut out = Vec::new();
        sample().write_to(&mut out).unwrap();

        for cut in [0, 2, 50, 140, 200, 300] {
            let result = StreamHeader::read_from(&mut Cursor::new(&out[..cut]), 128);
            assert!(matches!(result, Err(Error::StreamFormat(_))), "cut at {}", cut);
        }
    }

    #[test]
    fn test_bad_fields() {
        let mut unknown = Vec::new();
        sample().write_to(&mut unknown).unwrap();
        unknown[0] = 9;
        assert!(matches!(
            StreamHeader::read_from(&mut Cursor::new(unknown), 128),
            Err(Error::StreamFormat(_))
        ));

        let zero_len = [0u8, 0, 0, 1, 2, 3];
        assert!(matches!(
            StreamHeader::read_prefix(&mut Cursor::new(zero_len)),
            Err(Error::StreamFormat(_))
        ));
    }

    #[test]
    fn test_oversized_session_key() {
        let header = StreamHeader::new(DataType::Message, vec![0; 70_000], [0; 16]);
        assert!(matches!(
            header.prefix_bytes(),
            Err(Error::EncryptionFailed { .. })
        ));
    }
}
