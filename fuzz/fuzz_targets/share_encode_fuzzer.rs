//! Fuzz target for outbound share encoding
//!
//! # Invariants
//!
//! - Encoding never panics for arbitrary string lists
//! - A successful encode always frames a payload that is a whole number of
//!   32-byte blocks, with a matching length header

#![no_main]

use libfuzzer_sys::fuzz_target;
use spool_proto::codec::encode_shares;

fuzz_target!(|inputs: Vec<String>| {
    if let Ok(frame) = encode_shares(&inputs) {
        let mut header = [0u8; 4];
        header.copy_from_slice(&frame[..4]);
        let payload_len = u32::from_le_bytes(header) as usize;

        assert_eq!(payload_len, frame.len() - 4);
        assert_eq!(payload_len % 32, 0);
        assert!(payload_len > 0);
    }
});
