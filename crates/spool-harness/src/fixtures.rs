//! Shared protocol fixtures.
//!
//! The field parameters are real: each `r_inv` is the inverse of the
//! Montgomery radix `2^128` under its prime, so plaintext decoding through
//! these fixtures recovers canonical values.

use std::{path::Path, sync::Arc, time::Duration};

use spool_proto::ProtocolConfig;
use spool_stream::StreamerConfig;

/// Protocol fixture with a 128-bit prime field, player 0 of 2.
///
/// # Panics
///
/// Panics if the fixture constants fail to parse; acceptable for test code.
#[allow(clippy::expect_used)]
#[must_use]
pub fn gfp_protocol() -> Arc<ProtocolConfig> {
    Arc::new(ProtocolConfig {
        prime: "172035116406933162231178957667602464769".parse().expect("fixture prime"),
        r_inv: "116525037434575252203671714714489805504".parse().expect("fixture r_inv"),
        gf2n_bit_length: 40,
        gf2n_storage_size: 8,
        player_id: 0,
        player_count: 2,
        computation_timeout: Duration::from_secs(5),
        state_timeout: Duration::from_secs(60),
    })
}

/// Protocol fixture tilted toward the binary field, player 1 of 2.
///
/// # Panics
///
/// Panics if the fixture constants fail to parse; acceptable for test code.
#[allow(clippy::expect_used)]
#[must_use]
pub fn gf2n_protocol() -> Arc<ProtocolConfig> {
    Arc::new(ProtocolConfig {
        prime: "198766463529478683931867765928436695041".parse().expect("fixture prime"),
        r_inv: "133854242216446749056083838363708373830".parse().expect("fixture r_inv"),
        gf2n_bit_length: 40,
        gf2n_storage_size: 8,
        player_id: 1,
        player_count: 2,
        computation_timeout: Duration::from_secs(5),
        state_timeout: Duration::from_secs(60),
    })
}

/// Streamer configuration rooted in a scratch directory.
#[must_use]
pub fn streamer_config(data_dir: &Path, stock_size: usize, thread_count: u32) -> StreamerConfig {
    StreamerConfig {
        data_dir: data_dir.to_path_buf(),
        stock_size,
        thread_count,
        write_deadline: Duration::from_millis(200),
    }
}
