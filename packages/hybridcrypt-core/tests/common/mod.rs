//! Shared fixtures for the integration tests.
//!
//! RSA key generation dominates test time, so each test binary generates
//! its key pairs once and shares them.

#![allow(dead_code)]

use std::io::{self, Seek, SeekFrom, Write};
use std::sync::Arc;

use hybridcrypt_core::{KeyContainer, KeyHandle};
use once_cell::sync::Lazy;

/// Container holding the shared test key pairs
pub static KEYS: Lazy<KeyContainer> = Lazy::new(KeyContainer::new);

/// Sender key pair
pub static ALICE: Lazy<Arc<KeyHandle>> = Lazy::new(|| {
    init_tracing();
    KEYS.select_or_create("alice", 1024).unwrap()
});

/// Receiver key pair
pub static BOB: Lazy<Arc<KeyHandle>> = Lazy::new(|| {
    init_tracing();
    KEYS.select_or_create("bob", 1024).unwrap()
});

/// A third party
pub static MALLORY: Lazy<Arc<KeyHandle>> =
    Lazy::new(|| KEYS.select_or_create("mallory", 1024).unwrap());

/// Route library logs to the test harness; `RUST_LOG=debug` to see them
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic, non-trivial test data
pub fn sample_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 131 + 17) % 251) as u8).collect()
}

/// Writer that behaves like a pipe: it accepts bytes but cannot seek
#[derive(Default)]
pub struct PipeWriter {
    pub bytes: Vec<u8>,
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for PipeWriter {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "illegal seek"))
    }
}
