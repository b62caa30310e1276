//! # Encryption Demo
//!
//! Walks through the three ways of moving a message from Alice to Bob:
//! a whole-buffer packet, a stream, and a message hidden in a carrier.
//!
//! ## Run
//!
//! ```bash
//! RUST_LOG=debug cargo run --example encryption_demo
//! ```

use std::io::Cursor;

use hybridcrypt_core::{
    conceal, decrypt, decrypt_stream, encrypt, encrypt_stream, import_public, reveal, DataType,
    EncryptedPacket, KeyContainer, StreamLayout, StreamOptions,
};

fn main() -> hybridcrypt_core::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== HybridCrypt Core: Encryption Demo ===\n");

    // Step 1: Key pairs
    println!("Step 1: Creating 2048-bit key pairs for Alice and Bob...");
    let keys = KeyContainer::new();
    let alice = keys.select_or_create("alice", 2048)?;
    let bob = keys.select_or_create("bob", 2048)?;
    println!("  alice: {}", alice.fingerprint());
    println!("  bob:   {}", bob.fingerprint());

    // Bob only ever sees Alice's public half, exchanged as JSON
    let alice_public = import_public(keys.export_public("alice")?.to_json()?.as_bytes())?;
    println!();

    // Step 2: Whole-buffer packet
    println!("Step 2: Encrypting a message as a packet...");
    println!();
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │  session key ──RSA(bob)──► EncryptedSessionKey              │");
    println!("  │  plaintext ──AES-256-CBC──► EncryptedData                   │");
    println!("  │  prefix ‖ EncryptedData ──HMAC-SHA512──► Hmac               │");
    println!("  │  Hmac ──RSA sign(alice)──► Signature                        │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    let message = b"The eagle lands at midnight.";
    let packet = encrypt(&alice, DataType::Message, message, bob.public_key())?;
    let json = packet.to_json()?;
    println!("  plaintext:  {} bytes", message.len());
    println!("  ciphertext: {} bytes", packet.encrypted_data.len());
    println!("  hmac:       {}...", hex::encode(&packet.hmac[..8]));
    println!("  JSON form:  {} bytes", json.len());

    let received = EncryptedPacket::from_json(&json)?;
    let plaintext = decrypt(&bob, &received, &alice_public)?;
    println!("  Bob reads:  {:?}", String::from_utf8_lossy(&plaintext));

    let mut tampered = received.clone();
    tampered.encrypted_data[0] ^= 1;
    match decrypt(&bob, &tampered, &alice_public) {
        Err(e) => println!("  tampered:   rejected ({})", e),
        Ok(_) => println!("  tampered:   accepted?!"),
    }
    println!();

    // Step 3: Streams
    println!("Step 3: Streaming 1 MiB in both layouts...");
    let payload: Vec<u8> = (0..1024 * 1024).map(|i| (i % 251) as u8).collect();
    for layout in [StreamLayout::Patched, StreamLayout::Trailer] {
        let options = StreamOptions::default()
            .with_layout(layout)
            .with_chunk_size(16 * 1024);

        let mut sealed = Cursor::new(Vec::new());
        let mut input = payload.as_slice();
        let written = encrypt_stream(&alice, &mut input, &mut sealed, bob.public_key(), &options)?;

        let mut restored = Vec::new();
        sealed.set_position(0);
        let ok = decrypt_stream(&bob, &mut sealed, &mut restored, &alice_public, &options)?;
        println!(
            "  {:?}: {} bytes written, verified = {}, intact = {}",
            layout,
            written,
            ok,
            restored == payload
        );
    }
    println!();

    // Step 4: Steganography
    println!("Step 4: Hiding a message in a carrier...");
    let carrier: Vec<u8> = (0..16 * 1024).map(|i| (i * 7 % 256) as u8).collect();
    let mut stego = Vec::new();
    conceal(
        &alice,
        b"Look closer.",
        bob.public_key(),
        &mut Cursor::new(&carrier),
        &mut stego,
        &StreamOptions::default(),
    )?;
    let changed = carrier.iter().zip(&stego).filter(|(a, b)| a != b).count();
    println!("  carrier bytes changed: {} of {}", changed, carrier.len());

    let options = StreamOptions::default();
    let revealed = reveal(&bob, &mut Cursor::new(&stego), &alice_public, &options)?;
    println!("  Bob reveals: {:?}", String::from_utf8_lossy(&revealed));

    println!("\n=== Demo Complete ===");
    Ok(())
}
