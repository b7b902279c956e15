//! Fuzz target for inbound frame decoding
//!
//! # Strategy
//!
//! - Length header: zero, mismatched, huge, truncated
//! - Payload: empty, ragged, whole multiples of the chunk size
//!
//! # Invariants
//!
//! - Decoding never panics and never allocates past the input size
//! - A ragged payload is always a structured error
//! - Successful split decode yields one string per 32-byte block

#![no_main]

use libfuzzer_sys::fuzz_target;
use spool_proto::{ResponseDecoder, codec::decode_frame};

fuzz_target!(|data: &[u8]| {
    let split = decode_frame(data, &ResponseDecoder::Share, false);
    let aggregated = decode_frame(data, &ResponseDecoder::Share, true);

    // Both modes must agree on validity.
    assert_eq!(split.is_ok(), aggregated.is_ok());

    if let Ok(values) = split {
        assert_eq!(values.len(), (data.len() - 4) / 32);
    }
});
