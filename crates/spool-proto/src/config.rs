//! Per-computation protocol parameters.

use std::time::Duration;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::decoder::PlaintextDecoder;

/// Immutable parameters of one computation.
///
/// Loaded by the enclosing service and shared read-only (typically behind an
/// `Arc`) between the carrier, the streamers, and the feeder. The field
/// parameters must agree with the ones the engine was compiled against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Modulus of the prime field (`gfp`).
    pub prime: BigUint,

    /// `R⁻¹ mod prime`, where `R` is the engine's Montgomery radix.
    pub r_inv: BigUint,

    /// Bit length of the binary field (`gf2n`).
    pub gf2n_bit_length: u32,

    /// Storage size in bytes of one binary field element.
    pub gf2n_storage_size: u64,

    /// This worker's player id within the computation.
    pub player_id: u32,

    /// Number of cooperating players.
    pub player_count: u32,

    /// Upper bound on one computation; also the default per-write deadline
    /// on tuple FIFOs.
    pub computation_timeout: Duration,

    /// Upper bound the enclosing orchestrator applies to state transitions.
    pub state_timeout: Duration,
}

impl ProtocolConfig {
    /// Decoder for opened plaintext output under this field.
    #[must_use]
    pub fn plaintext_decoder(&self) -> PlaintextDecoder {
        PlaintextDecoder::new(self.r_inv.clone(), self.prime.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_serde() {
        let config = ProtocolConfig {
            prime: "198766463529478683931867765928436695041".parse().unwrap(),
            r_inv: "133854242216446749056083838363708373830".parse().unwrap(),
            gf2n_bit_length: 40,
            gf2n_storage_size: 8,
            player_id: 0,
            player_count: 2,
            computation_timeout: Duration::from_secs(10),
            state_timeout: Duration::from_secs(60),
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: ProtocolConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.prime, config.prime);
        assert_eq!(back.computation_timeout, config.computation_timeout);
    }
}
