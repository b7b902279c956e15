//! Fuzz target for the Montgomery plaintext decoder
//!
//! # Invariants
//!
//! - Conversion never panics for any payload
//! - Every recovered value is a canonical residue below the prime

#![no_main]

use libfuzzer_sys::fuzz_target;
use num_bigint::BigUint;
use spool_proto::PlaintextDecoder;

fn field_prime() -> BigUint {
    "172035116406933162231178957667602464769".parse().unwrap()
}

fn field_r_inv() -> BigUint {
    "116525037434575252203671714714489805504".parse().unwrap()
}

fuzz_target!(|data: &[u8]| {
    let prime = field_prime();
    let decoder = PlaintextDecoder::new(field_r_inv(), prime.clone());

    if let Ok(parcels) = decoder.convert(data) {
        assert_eq!(parcels.len(), data.len() / 16);
        for parcel in parcels {
            let decimal = String::from_utf8(parcel.body.to_vec()).unwrap();
            let value: BigUint = decimal.parse().unwrap();
            assert!(value < prime);
        }
    }
});
