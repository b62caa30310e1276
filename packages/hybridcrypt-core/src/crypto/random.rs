//! Cryptographically secure random bytes.
//!
//! Every session key and IV comes from the operating system's CSPRNG
//! (`rand::rngs::OsRng`). Nothing here is seeded or reproducible.

use rand::rngs::OsRng;
use rand::RngCore;

/// Fill `buf` with random bytes from the OS generator
pub fn fill_random(buf: &mut [u8]) {
    OsRng.fill_bytes(buf);
}

/// Create an array of `N` random bytes
pub fn random_array<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    fill_random(&mut bytes);
    bytes
}

/// Create a vector of `len` random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    fill_random(&mut bytes);
    bytes
}
