//! # Whole-Buffer Engine
//!
//! Encrypts a plaintext held in memory into an [`EncryptedPacket`] and back.
//!
//! ## Encrypt
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          PACKET ENCRYPTION                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Sender                                                                 │
//! │  ──────                                                                 │
//! │  1. session_key, iv = OsRng(32), OsRng(16)                             │
//! │  2. esk = RSA-Encrypt(receiver_public, session_key)                    │
//! │  3. aes_key, mac_key = HKDF(session_key)                               │
//! │  4. ciphertext = AES-256-CBC(aes_key, iv, plaintext)                   │
//! │  5. hmac = HMAC-SHA512(mac_key, type ‖ esk_len ‖ esk ‖ iv ‖ ct)        │
//! │  6. signature = RSA-Sign(sender_private, hmac)                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Decrypt
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          PACKET DECRYPTION                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Receiver                                                               │
//! │  ────────                                                               │
//! │  1. session_key = RSA-Decrypt(own_private, esk)   fail → Integrity     │
//! │  2. recompute hmac, constant-time compare         fail → Integrity     │
//! │  3. verify signature with sender_public           fail → Authentication│
//! │  4. plaintext = AES-256-CBC-Decrypt(...)          fail → Decryption    │
//! │                                                                         │
//! │  Steps run strictly in order; each failure aborts before the next.     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::io::Read;

use rsa::RsaPublicKey;

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::crypto::{
    compare_digests, decrypt_buffer, encrypt_buffer, fingerprint, hmac_sha512, verify_signature,
    wrap_session_key, CbcEncryptStream, KeyHandle, MacAccumulator, SessionKey, SubKeys, IV_SIZE,
};
use crate::error::{Error, Result};
use crate::packet::{DataType, EncryptedPacket, EncryptedPacketBuilder};
use crate::stream::{encrypt_chunks, StreamHeader};

// ============================================================================
// SEALING
// ============================================================================

/// Sending-side state for one packet or stream
///
/// Holds the derived keys and the running HMAC, which already covers the
/// header prefix. The session key itself is dropped (and zeroized) as soon
/// as it has been wrapped and split.
pub(crate) struct Sealer {
    keys: SubKeys,
    iv: [u8; IV_SIZE],
    header: StreamHeader,
    prefix: Vec<u8>,
    mac: MacAccumulator,
}

impl Sealer {
    /// Generate a session key for `receiver` and start the MAC
    pub(crate) fn begin(data_type: DataType, receiver: &RsaPublicKey) -> Result<Self> {
        let session = SessionKey::generate();
        let esk = wrap_session_key(&session, receiver)?;
        let keys = session.derive()?;
        let iv = *session.iv();

        let header = StreamHeader::new(data_type, esk, iv);
        let prefix = header.prefix_bytes()?;
        let mut mac = MacAccumulator::new(&keys.mac_key);
        mac.update(&prefix);

        Ok(Self {
            keys,
            iv,
            header,
            prefix,
            mac,
        })
    }

    /// Encoded header prefix
    pub(crate) fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// A fresh incremental cipher for this session
    pub(crate) fn cipher(&self) -> CbcEncryptStream {
        CbcEncryptStream::new(&self.keys.cipher_key, &self.iv)
    }

    /// Feed ciphertext into the MAC
    pub(crate) fn absorb(&mut self, ciphertext: &[u8]) {
        self.mac.update(ciphertext);
    }

    /// Finish the MAC, sign it, and return the completed header
    pub(crate) fn seal(self, sender: &KeyHandle) -> Result<StreamHeader> {
        let Sealer { mut header, mac, .. } = self;
        header.hmac = mac.finalize();
        header.signature = sender.sign_digest(&header.hmac)?;
        Ok(header)
    }
}

fn into_packet(header: StreamHeader, ciphertext: Vec<u8>) -> Result<EncryptedPacket> {
    EncryptedPacketBuilder::default()
        .data_type(header.data_type)
        .encrypted_session_key(header.encrypted_session_key)
        .iv(header.iv)
        .hmac(header.hmac)
        .signature(header.signature)
        .encrypted_data(ciphertext)
        .build()
}

// ============================================================================
// ENCRYPT
// ============================================================================

/// Encrypt `plaintext` for `receiver`, signed by `sender`
///
/// ## Parameters
///
/// - `sender` - Our key pair; signs the packet HMAC
/// - `data_type` - Metadata tag carried in the packet
/// - `plaintext` - Bytes to encrypt (may be empty)
/// - `receiver` - Public key the session key is wrapped for
///
/// ## Errors
///
/// - `EncryptionFailed` if the receiver key is too small to wrap a
///   session key or a primitive call fails
///
/// ## Example
///
/// ```ignore
/// let packet = encrypt(&alice, DataType::Message, b"hi bob", bob.public_key())?;
/// let plain = decrypt(&bob, &packet, alice.public_key())?;
/// ```
pub fn encrypt(
    sender: &KeyHandle,
    data_type: DataType,
    plaintext: &[u8],
    receiver: &RsaPublicKey,
) -> Result<EncryptedPacket> {
    tracing::debug!(
        "Encrypting {} bytes as {} for {}",
        plaintext.len(),
        data_type,
        fingerprint(receiver)
    );

    let mut sealer = Sealer::begin(data_type, receiver)?;
    let ciphertext = encrypt_buffer(plaintext, &sealer.keys.cipher_key, &sealer.iv);
    sealer.absorb(&ciphertext);
    let header = sealer.seal(sender)?;

    into_packet(header, ciphertext)
}

/// Encrypt everything `reader` yields into a `DataType::File` packet
///
/// The plaintext is never held whole; only the ciphertext is collected.
pub fn encrypt_reader<R: Read>(
    sender: &KeyHandle,
    reader: &mut R,
    receiver: &RsaPublicKey,
) -> Result<EncryptedPacket> {
    let mut sealer = Sealer::begin(DataType::File, receiver)?;

    let mut ciphertext = Vec::new();
    encrypt_chunks(reader, &mut sealer, DEFAULT_CHUNK_SIZE, |chunk| {
        ciphertext.extend_from_slice(chunk);
        Ok(())
    })?;

    tracing::debug!(
        "Encrypted reader into {} ciphertext bytes for {}",
        ciphertext.len(),
        fingerprint(receiver)
    );

    let header = sealer.seal(sender)?;
    into_packet(header, ciphertext)
}

// ============================================================================
// DECRYPT
// ============================================================================

/// Options for [`decrypt_with_options`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecryptOptions {
    /// Skip the signature check
    ///
    /// Only honoured when the sender key is the receiver's own public key,
    /// i.e. when re-reading a packet we sealed for ourselves.
    pub skip_signature_check: bool,
}

/// Decrypt a packet addressed to `receiver` and signed by `sender_public`
///
/// ## Errors
///
/// - `IntegrityFailed` if the session key cannot be unwrapped or the HMAC
///   does not match
/// - `AuthenticationFailed` if the signature does not verify
/// - `DecryptionFailed` if the ciphertext is not valid AES-CBC/PKCS7
pub fn decrypt(
    receiver: &KeyHandle,
    packet: &EncryptedPacket,
    sender_public: &RsaPublicKey,
) -> Result<Vec<u8>> {
    decrypt_with_options(receiver, packet, sender_public, DecryptOptions::default())
}

/// [`decrypt`] with explicit options
pub fn decrypt_with_options(
    receiver: &KeyHandle,
    packet: &EncryptedPacket,
    sender_public: &RsaPublicKey,
    options: DecryptOptions,
) -> Result<Vec<u8>> {
    if options.skip_signature_check && sender_public != receiver.public_key() {
        return Err(Error::authentication(
            "signature check can only be skipped for packets sealed with our own key",
        ));
    }

    tracing::debug!(
        "Decrypting {} packet from {} with '{}'",
        packet.data_type,
        fingerprint(sender_public),
        receiver.container_name()
    );

    let keys = receiver
        .unwrap_session_key(&packet.encrypted_session_key, packet.iv)?
        .derive()?;

    let prefix = packet
        .mac_prefix()
        .map_err(|_| Error::MalformedPacket("encrypted session key too long".into()))?;
    let expected = hmac_sha512(&keys.mac_key, &[&prefix, &packet.encrypted_data]);

    if !compare_digests(&expected, &packet.hmac) {
        tracing::warn!("Rejected {} packet: HMAC mismatch", packet.data_type);
        return Err(Error::IntegrityFailed("HMAC does not match packet contents".into()));
    }

    if !options.skip_signature_check {
        verify_signature(sender_public, &packet.hmac, &packet.signature).map_err(|e| {
            tracing::warn!("Rejected {} packet: {}", packet.data_type, e);
            e
        })?;
    }

    decrypt_buffer(&packet.encrypted_data, &keys.cipher_key, &packet.iv)
}

// ============================================================================
// TESTS
// ============================================================================
