//! # Steganography
//!
//! Hides an opaque byte string in the least-significant bits of a carrier.
//!
//! ## Carrier Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          STEGO CARRIER                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  carrier bytes 0..64        8-byte little-endian payload length L      │
//! │  carrier bytes 64..64+8L    payload, 8 carrier bytes per payload byte  │
//! │  carrier bytes 64+8L..      copied through untouched                   │
//! │                                                                         │
//! │  Within each group of 8:  carrier[k].lsb = payload_bit(7 - k)          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The codec is format-agnostic: the carrier is any byte sequence the
//! caller is willing to perturb by one bit per byte. [`conceal`] and
//! [`reveal`] combine it with the streaming engine so the hidden payload is
//! always encrypted and signed.

mod bits;
mod codec;
mod sealed;

pub use bits::{glue_bits, scatter_bits, CARRIER_BYTES_PER_BYTE};
pub use codec::{
    embed, embed_bytes, extract, required_carrier_len, HEADER_CARRIER_LEN, LENGTH_PREFIX_LEN,
};
pub use sealed::{conceal, reveal};
