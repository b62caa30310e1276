//! Integration tests for whole-buffer packet encryption
//!
//! Every single-bit change to a field the HMAC covers must be rejected as
//! an integrity failure; a bad signature is an authentication failure.

mod common;

use common::{sample_data, ALICE, BOB, MALLORY};
use hybridcrypt_core::{
    decrypt, decrypt_with_options, encrypt, import_public, DataType, DecryptOptions,
    EncryptedPacket, Error,
};

fn message_packet(plaintext: &[u8]) -> EncryptedPacket {
    encrypt(&ALICE, DataType::Message, plaintext, BOB.public_key()).unwrap()
}

/// Test round trip for a range of plaintext sizes, including block edges
#[test]
fn test_roundtrip_sizes() {
    for len in [0, 1, 15, 16, 17, 31, 32, 33, 1000, 65_537] {
        let plaintext = sample_data(len);
        let packet = message_packet(&plaintext);

        assert_eq!(packet.encrypted_data.len(), (len / 16 + 1) * 16, "len {}", len);
        assert_eq!(decrypt(&BOB, &packet, ALICE.public_key()).unwrap(), plaintext);
    }
}

/// Test every DataType round trips and is carried unchanged
#[test]
fn test_data_types() {
    for data_type in [DataType::Message, DataType::File, DataType::Steganography] {
        let packet = encrypt(&ALICE, data_type, b"typed payload", BOB.public_key()).unwrap();
        assert_eq!(packet.data_type, data_type);
        assert_eq!(decrypt(&BOB, &packet, ALICE.public_key()).unwrap(), b"typed payload");
    }
}

/// Test that two encryptions of the same plaintext share nothing
#[test]
fn test_freshness() {
    let a = message_packet(b"same message");
    let b = message_packet(b"same message");

    assert_ne!(a.iv, b.iv);
    assert_ne!(a.encrypted_session_key, b.encrypted_session_key);
    assert_ne!(a.encrypted_data, b.encrypted_data);
    assert_ne!(a.hmac, b.hmac);
}

/// Test single-bit flips in the HMAC
#[test]
fn test_tampered_hmac() {
    let original = message_packet(b"integrity matters");
    for bit in [0, 7, 100, 511] {
        let mut packet = original.clone();
        packet.hmac[bit / 8] ^= 1 << (bit % 8);
        assert!(
            matches!(decrypt(&BOB, &packet, ALICE.public_key()), Err(Error::IntegrityFailed(_))),
            "hmac bit {}",
            bit
        );
    }
}

/// Test single-bit flips across the ciphertext
#[test]
fn test_tampered_ciphertext() {
    let original = message_packet(&sample_data(100));
    let bits = original.encrypted_data.len() * 8;
    for bit in [0, 1, 64, bits / 2, bits - 1] {
        let mut packet = original.clone();
        packet.encrypted_data[bit / 8] ^= 1 << (bit % 8);
        assert!(
            matches!(decrypt(&BOB, &packet, ALICE.public_key()), Err(Error::IntegrityFailed(_))),
            "ciphertext bit {}",
            bit
        );
    }
}

/// Test single-bit flips in the wrapped session key
#[test]
fn test_tampered_session_key() {
    let original = message_packet(b"wrapped");
    for byte in [0, 1, 64, 127] {
        let mut packet = original.clone();
        packet.encrypted_session_key[byte] ^= 0x10;
        assert!(
            matches!(decrypt(&BOB, &packet, ALICE.public_key()), Err(Error::IntegrityFailed(_))),
            "session key byte {}",
            byte
        );
    }
}

/// Test single-bit flips in the IV
#[test]
fn test_tampered_iv() {
    let original = message_packet(b"the iv is covered by the hmac");
    for bit in 0..128 {
        let mut packet = original.clone();
        packet.iv[bit / 8] ^= 1 << (bit % 8);
        assert!(
            matches!(decrypt(&BOB, &packet, ALICE.public_key()), Err(Error::IntegrityFailed(_))),
            "iv bit {}",
            bit
        );
    }
}

/// Test that a forged signature is an authentication failure
#[test]
fn test_tampered_signature() {
    let mut packet = message_packet(b"signed by alice");
    packet.signature[10] ^= 0x01;

    let err = decrypt(&BOB, &packet, ALICE.public_key()).unwrap_err();
    assert!(matches!(err, Error::AuthenticationFailed { .. }));
    assert!(err.is_tamper_evidence());
}

/// Test that a packet re-signed by a third party is refused
#[test]
fn test_substituted_signer() {
    let mut packet = message_packet(b"from alice");
    packet.signature = MALLORY.sign_digest(&packet.hmac).unwrap();

    assert!(matches!(
        decrypt(&BOB, &packet, ALICE.public_key()),
        Err(Error::AuthenticationFailed { .. })
    ));
    // It does verify against Mallory, which is the point of naming the sender
    assert_eq!(
        decrypt(&BOB, &packet, MALLORY.public_key()).unwrap(),
        b"from alice"
    );
}

/// Test that only the addressed receiver can decrypt
#[test]
fn test_wrong_receiver() {
    let packet = message_packet(b"bob only");
    assert!(matches!(
        decrypt(&MALLORY, &packet, ALICE.public_key()),
        Err(Error::IntegrityFailed(_))
    ));
}

/// Test re-reading our own sent copy without the signature check
#[test]
fn test_own_copy_skip_signature() {
    let packet = encrypt(&ALICE, DataType::Message, b"sent items", ALICE.public_key()).unwrap();
    let skip = DecryptOptions {
        skip_signature_check: true,
    };

    assert_eq!(
        decrypt_with_options(&ALICE, &packet, ALICE.public_key(), skip).unwrap(),
        b"sent items"
    );

    let for_bob = message_packet(b"not mine");
    assert!(matches!(
        decrypt_with_options(&BOB, &for_bob, ALICE.public_key(), skip),
        Err(Error::AuthenticationFailed { .. })
    ));
}

/// Test the JSON transport form with an imported sender key
#[test]
fn test_json_transport_with_imported_key() {
    let packet = message_packet(b"over the wire");
    let json = packet.to_json().unwrap();

    let sender_json = ALICE.export_public().to_json().unwrap();
    let sender = import_public(sender_json.as_bytes()).unwrap();

    let received = EncryptedPacket::from_json(&json).unwrap();
    assert_eq!(decrypt(&BOB, &received, &sender).unwrap(), b"over the wire");
}

/// Test the binary form round trips through the codec
#[test]
fn test_binary_form() {
    let packet = message_packet(&sample_data(300));
    let bytes = packet.to_bytes().unwrap();

    let parsed = EncryptedPacket::from_bytes(&bytes, ALICE.modulus_len()).unwrap();
    assert_eq!(parsed, packet);
    assert_eq!(decrypt(&BOB, &parsed, ALICE.public_key()).unwrap(), sample_data(300));
}

/// Test that JSON missing a required field is a malformed packet
#[test]
fn test_json_missing_hmac() {
    let json = message_packet(b"incomplete").to_json().unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
    value.as_object_mut().unwrap().remove("hmac");

    assert!(matches!(
        EncryptedPacket::from_json(&value.to_string()),
        Err(Error::MalformedPacket(_))
    ));
}
