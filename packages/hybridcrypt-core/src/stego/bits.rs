//! Bit scattering between one payload byte and eight carrier bytes.
//!
//! ```text
//! payload byte   b7 b6 b5 b4 b3 b2 b1 b0      (b7 = most significant)
//!                 │  │  │  │  │  │  │  │
//! carrier index   0  1  2  3  4  5  6  7      only the LSB of each changes
//! ```

/// Carrier bytes consumed per payload byte
pub const CARRIER_BYTES_PER_BYTE: usize = 8;

/// Rebuild one byte from the least-significant bits of eight carrier bytes
///
/// Carrier byte `k` supplies bit `7 - k`, so byte 0 holds the MSB.
pub fn glue_bits(carrier: &[u8; CARRIER_BYTES_PER_BYTE]) -> u8 {
    glue_group(carrier)
}

/// Write `byte` into the least-significant bits of eight carrier bytes
///
/// All other carrier bits are left as they were.
pub fn scatter_bits(carrier: &mut [u8; CARRIER_BYTES_PER_BYTE], byte: u8) {
    scatter_group(carrier, byte)
}

pub(crate) fn glue_group(group: &[u8]) -> u8 {
    group
        .iter()
        .take(CARRIER_BYTES_PER_BYTE)
        .enumerate()
        .fold(0u8, |acc, (k, c)| acc | ((c & 1) << (7 - k)))
}

pub(crate) fn scatter_group(group: &mut [u8], byte: u8) {
    for (k, c) in group.iter_mut().take(CARRIER_BYTES_PER_BYTE).enumerate() {
        *c = (*c & 0xFE) | ((byte >> (7 - k)) & 1);
    }
}
