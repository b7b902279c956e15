//! Preprocessing file headers.
//!
//! The engine expects every tuple FIFO to begin with a header describing the
//! arithmetic domain of the bytes that follow. All integer fields are
//! little-endian; the prime itself is big-endian, minimally encoded.
//!
//! Layout for the prime field:
//!
//! ```text
//! [total: u64 LE] + "SPDZ gfp" + [signum: u8 = 0] + [prime len: u32 LE] + [prime BE]
//! ```
//!
//! and for the binary field (the trailing underscore is part of the
//! descriptor):
//!
//! ```text
//! [total: u64 LE] + "SPDZ gf2n_" + [storage size: u64 LE] + [bit length: u32 LE]
//! ```
//!
//! `total` counts every byte after itself.

use bytes::BufMut;

use crate::{config::ProtocolConfig, kind::Protocol};

/// Domain descriptor for the prime field.
pub const GFP_DESCRIPTOR: &[u8] = b"SPDZ gfp";

/// Domain descriptor for the binary field.
pub const GF2N_DESCRIPTOR: &[u8] = b"SPDZ gf2n_";

/// Build the file header for one tuple FIFO.
///
/// The header is a pure function of the protocol parameters; every streamer
/// of the same domain writes identical bytes.
#[must_use]
pub fn tuple_file_header(config: &ProtocolConfig, protocol: Protocol) -> Vec<u8> {
    match protocol {
        Protocol::Prime => gfp_header(config),
        Protocol::Binary => gf2n_header(config),
    }
}

fn gfp_header(config: &ProtocolConfig) -> Vec<u8> {
    let prime = config.prime.to_bytes_be();
    let total = (GFP_DESCRIPTOR.len() + 1 + 4 + prime.len()) as u64;

    let mut header = Vec::with_capacity(8 + total as usize);
    header.put_u64_le(total);
    header.put_slice(GFP_DESCRIPTOR);
    header.put_u8(0); // signum
    header.put_u32_le(prime.len() as u32);
    header.put_slice(&prime);
    header
}

fn gf2n_header(config: &ProtocolConfig) -> Vec<u8> {
    let total = (GF2N_DESCRIPTOR.len() + 12) as u64;

    let mut header = Vec::with_capacity(8 + total as usize);
    header.put_u64_le(total);
    header.put_slice(GF2N_DESCRIPTOR);
    header.put_u64_le(config.gf2n_storage_size);
    header.put_u32_le(config.gf2n_bit_length);
    header
}
