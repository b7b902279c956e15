//! Conversion of raw engine output into consumable responses.
//!
//! The engine returns either secret shares (32-byte blocks, handed back to
//! the caller still secret) or opened values (16-byte field elements in
//! Montgomery form, recovered to canonical integers here). The two paths
//! share one entry point, [`ResponseDecoder::convert`], so the carrier can
//! stay agnostic of the output mode.

use num_bigint::BigUint;

use crate::{
    errors::{ProtocolError, Result},
    parcel::{FIELD_ELEMENT, Parcel, SHARE_BLOCK},
};

/// Response conversion strategy, chosen per activation from the output mode.
#[derive(Debug, Clone)]
pub enum ResponseDecoder {
    /// Pass 32-byte share blocks through as base64.
    Share,

    /// Recover canonical integers from Montgomery-form field elements.
    Plaintext(PlaintextDecoder),
}

impl ResponseDecoder {
    /// Convert a response payload into parcels.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::BadBodySize` on the share path if the payload is
    ///   empty or not a multiple of 32 bytes.
    /// - `ProtocolError::BadWordSize` on the plaintext path if the payload
    ///   is empty or not a multiple of 16 bytes.
    pub fn convert(&self, payload: &[u8]) -> Result<Vec<Parcel>> {
        match self {
            Self::Share => convert_shares(payload),
            Self::Plaintext(decoder) => decoder.convert(payload),
        }
    }
}

fn convert_shares(payload: &[u8]) -> Result<Vec<Parcel>> {
    if payload.is_empty() || payload.len() % SHARE_BLOCK != 0 {
        return Err(ProtocolError::BadBodySize {
            expected: SHARE_BLOCK,
            received: payload.len(),
        });
    }
    Ok(payload.chunks_exact(SHARE_BLOCK).map(Parcel::share).collect())
}

/// Recovers canonical field values from the engine's Montgomery
/// representation.
///
/// The engine emits each opened element as two 8-byte little-endian limbs,
/// low limb first, so the 16 bytes read as one little-endian integer yield
/// the Montgomery representative `x = v · R mod p`. Multiplying by
/// `r_inv = R⁻¹ mod p` recovers the canonical residue `v`.
#[derive(Debug, Clone)]
pub struct PlaintextDecoder {
    r_inv: BigUint,
    prime: BigUint,
}

impl PlaintextDecoder {
    /// Build a decoder for the given field parameters.
    #[must_use]
    pub fn new(r_inv: BigUint, prime: BigUint) -> Self {
        Self { r_inv, prime }
    }

    /// Convert a payload of 16-byte field elements into decimal parcels.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::BadWordSize` if the payload is empty or not a
    ///   multiple of 16 bytes.
    pub fn convert(&self, payload: &[u8]) -> Result<Vec<Parcel>> {
        if payload.is_empty() || payload.len() % FIELD_ELEMENT != 0 {
            return Err(ProtocolError::BadWordSize {
                expected: FIELD_ELEMENT,
                received: payload.len(),
            });
        }

        Ok(payload
            .chunks_exact(FIELD_ELEMENT)
            .map(|chunk| Parcel::plaintext(payload.len(), self.reduce(chunk)))
            .collect())
    }

    fn reduce(&self, chunk: &[u8]) -> String {
        let x = BigUint::from_bytes_le(chunk);
        let canonical = (x * &self.r_inv) % &self.prime;
        canonical.to_string()
    }
}
