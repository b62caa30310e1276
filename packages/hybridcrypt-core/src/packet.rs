//! # Encrypted Packet
//!
//! The in-memory form produced by whole-buffer encryption.
//!
//! ## Structure
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ENCRYPTED PACKET                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  data_type              Message | File | Steganography (metadata only) │
//! │  encrypted_session_key  RSA(session key) for the receiver              │
//! │  iv                     16 bytes                                        │
//! │  hmac                   HMAC-SHA512(mac_key, prefix ‖ encrypted_data)  │
//! │  signature              RSA-SHA512 signature over hmac by the sender   │
//! │  encrypted_data         AES-256-CBC ciphertext                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two encodings exist. [`EncryptedPacket::to_bytes`] produces the binary
//! stream layout, so a serialized packet can be fed straight to
//! [`crate::stream::decrypt_stream`]. The serde form (JSON with base64 byte
//! fields) is for handing packets to a transport.
//!
//! The codec itself has no cryptographic logic.

use std::io::Cursor;

use serde::{Deserialize, Serialize};

use crate::crypto::{HMAC_SIZE, IV_SIZE};
use crate::error::{Error, Result};
use crate::stream::StreamHeader;

/// What the plaintext is; never changes how it is encrypted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataType {
    /// A text message
    Message = 0,
    /// File contents
    File = 1,
    /// Payload destined for (or taken from) a steganographic carrier
    Steganography = 2,
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(DataType::Message),
            1 => Ok(DataType::File),
            2 => Ok(DataType::Steganography),
            other => Err(Error::MalformedPacket(format!("unknown data type tag {}", other))),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Message => write!(f, "message"),
            DataType::File => write!(f, "file"),
            DataType::Steganography => write!(f, "steganography"),
        }
    }
}

/// A complete encrypted packet
///
/// Deserialization goes through [`EncryptedPacketBuilder::build`], so a
/// decoded packet passes the same field checks as a built one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPacket")]
pub struct EncryptedPacket {
    /// Payload kind
    pub data_type: DataType,

    /// Session key wrapped with the receiver's public key
    #[serde(serialize_with = "base64_bytes::serialize")]
    pub encrypted_session_key: Vec<u8>,

    /// CBC initialization vector
    #[serde(serialize_with = "base64_bytes::serialize")]
    pub iv: [u8; IV_SIZE],

    /// HMAC-SHA512 over the header prefix and ciphertext
    #[serde(serialize_with = "base64_bytes::serialize")]
    pub hmac: [u8; HMAC_SIZE],

    /// Sender's signature over `hmac`
    #[serde(serialize_with = "base64_bytes::serialize")]
    pub signature: Vec<u8>,

    /// AES-256-CBC ciphertext
    #[serde(serialize_with = "base64_bytes::serialize")]
    pub encrypted_data: Vec<u8>,
}

impl EncryptedPacket {
    /// Start building a packet field by field
    pub fn builder() -> EncryptedPacketBuilder {
        EncryptedPacketBuilder::default()
    }

    /// Header fields as a [`StreamHeader`]
    pub fn header(&self) -> StreamHeader {
        StreamHeader {
            data_type: self.data_type,
            encrypted_session_key: self.encrypted_session_key.clone(),
            iv: self.iv,
            hmac: self.hmac,
            signature: self.signature.clone(),
        }
    }

    /// The bytes the HMAC covers ahead of the ciphertext
    pub fn mac_prefix(&self) -> Result<Vec<u8>> {
        self.header().prefix_bytes()
    }

    /// Encode in the binary stream layout
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let header = self.header();
        let mut bytes =
            Vec::with_capacity(header.header_len(self.signature.len()) + self.encrypted_data.len());
        header.write_to(&mut bytes)?;
        bytes.extend_from_slice(&self.encrypted_data);
        Ok(bytes)
    }

    /// Decode the binary stream layout
    ///
    /// `signature_len` is the sender's modulus length in bytes; everything
    /// after the signature is taken as ciphertext.
    ///
    /// ## Errors
    ///
    /// - `MalformedPacket` if the bytes are truncated or a field is invalid
    pub fn from_bytes(bytes: &[u8], signature_len: usize) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let header = StreamHeader::read_from(&mut cursor, signature_len).map_err(|e| match e {
            Error::StreamFormat(msg) => Error::MalformedPacket(msg),
            other => other,
        })?;

        let offset = cursor.position() as usize;
        EncryptedPacketBuilder::from_header(header)
            .encrypted_data(bytes[offset..].to_vec())
            .build()
    }

    /// Encode as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON
    ///
    /// ## Errors
    ///
    /// - `Serialization` if the text is not a JSON object of the right shape
    /// - `MalformedPacket` if a field is missing, empty, not base64 or of
    ///   the wrong length
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawPacket = serde_json::from_str(json)?;
        Self::try_from(raw)
    }
}

/// Field-by-field packet construction
///
/// ## Example
///
/// ```ignore
/// let packet = EncryptedPacket::builder()
///     .data_type(DataType::Message)
///     .encrypted_session_key(esk)
///     .iv(iv)
///     .hmac(hmac)
///     .signature(signature)
///     .encrypted_data(ciphertext)
///     .build()?;
/// ```
#[derive(Debug, Default, Clone)]
pub struct EncryptedPacketBuilder {
    data_type: Option<DataType>,
    encrypted_session_key: Option<Vec<u8>>,
    iv: Option<[u8; IV_SIZE]>,
    hmac: Option<[u8; HMAC_SIZE]>,
    signature: Option<Vec<u8>>,
    encrypted_data: Option<Vec<u8>>,
}

impl EncryptedPacketBuilder {
    fn from_header(header: StreamHeader) -> Self {
        Self {
            data_type: Some(header.data_type),
            encrypted_session_key: Some(header.encrypted_session_key),
            iv: Some(header.iv),
            hmac: Some(header.hmac),
            signature: Some(header.signature),
            encrypted_data: None,
        }
    }

    /// Set the payload kind
    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Set the wrapped session key
    pub fn encrypted_session_key(mut self, esk: Vec<u8>) -> Self {
        self.encrypted_session_key = Some(esk);
        self
    }

    /// Set the IV
    pub fn iv(mut self, iv: [u8; IV_SIZE]) -> Self {
        self.iv = Some(iv);
        self
    }

    /// Set the HMAC
    pub fn hmac(mut self, hmac: [u8; HMAC_SIZE]) -> Self {
        self.hmac = Some(hmac);
        self
    }

    /// Set the signature
    pub fn signature(mut self, signature: Vec<u8>) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Set the ciphertext
    pub fn encrypted_data(mut self, data: Vec<u8>) -> Self {
        self.encrypted_data = Some(data);
        self
    }

    /// Finish the packet
    ///
    /// ## Errors
    ///
    /// - `MalformedPacket` naming the first missing or empty field
    pub fn build(self) -> Result<EncryptedPacket> {
        let data_type = self.data_type.ok_or_else(|| missing("data_type"))?;
        let encrypted_session_key = non_empty(self.encrypted_session_key, "encrypted_session_key")?;
        let iv = self.iv.ok_or_else(|| missing("iv"))?;
        let hmac = self.hmac.ok_or_else(|| missing("hmac"))?;
        let signature = non_empty(self.signature, "signature")?;
        let encrypted_data = non_empty(self.encrypted_data, "encrypted_data")?;

        if encrypted_session_key.len() > u16::MAX as usize {
            return Err(Error::MalformedPacket(format!(
                "encrypted_session_key is {} bytes, limit is {}",
                encrypted_session_key.len(),
                u16::MAX
            )));
        }

        Ok(EncryptedPacket {
            data_type,
            encrypted_session_key,
            iv,
            hmac,
            signature,
            encrypted_data,
        })
    }
}

fn missing(field: &str) -> Error {
    Error::MalformedPacket(format!("missing field `{}`", field))
}

fn non_empty(value: Option<Vec<u8>>, field: &str) -> Result<Vec<u8>> {
    match value {
        Some(bytes) if !bytes.is_empty() => Ok(bytes),
        Some(_) => Err(Error::MalformedPacket(format!("field `{}` is empty", field))),
        None => Err(missing(field)),
    }
}

/// JSON form as received, before any field is checked
#[derive(Deserialize)]
struct RawPacket {
    data_type: Option<DataType>,
    encrypted_session_key: Option<String>,
    iv: Option<String>,
    hmac: Option<String>,
    signature: Option<String>,
    encrypted_data: Option<String>,
}

impl TryFrom<RawPacket> for EncryptedPacket {
    type Error = Error;

    fn try_from(raw: RawPacket) -> Result<Self> {
        let decode = |text: Option<String>, field: &str| {
            text.map(|t| base64_bytes::decode(&t, field)).transpose()
        };

        EncryptedPacketBuilder {
            data_type: raw.data_type,
            encrypted_session_key: decode(raw.encrypted_session_key, "encrypted_session_key")?,
            iv: decode(raw.iv, "iv")?
                .map(|bytes| base64_bytes::to_array(bytes, "iv"))
                .transpose()?,
            hmac: decode(raw.hmac, "hmac")?
                .map(|bytes| base64_bytes::to_array(bytes, "hmac"))
                .transpose()?,
            signature: decode(raw.signature, "signature")?,
            encrypted_data: decode(raw.encrypted_data, "encrypted_data")?,
        }
        .build()
    }
}

/// Byte fields as standard base64
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde::Serializer;

    use crate::error::Error;

    pub fn serialize<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]>,
        S: Serializer,
    {
        serializer.serialize_str(&BASE64.encode(bytes.as_ref()))
    }

    pub fn decode(text: &str, field: &str) -> Result<Vec<u8>, Error> {
        BASE64.decode(text.as_bytes()).map_err(|e| {
            Error::MalformedPacket(format!("field `{}` is not base64: {}", field, e))
        })
    }

    pub fn to_array<const N: usize>(bytes: Vec<u8>, field: &str) -> Result<[u8; N], Error> {
        let len = bytes.len();
        <[u8; N]>::try_from(bytes).map_err(|_| {
            Error::MalformedPacket(format!("field `{}` is {} bytes, expected {}", field, len, N))
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
