//! Deterministic request-id derivation.
//!
//! Tuple requests must be coordinated across players without communication:
//! every player derives the same UUID sequence for the same
//! `(game, kind, thread)` stream, so the randomness service can hand each of
//! them the matching halves of the same tuples.
//!
//! The base id digests the game id together with the kind label and thread
//! index; each fetch cycle digests the base id together with the cycle
//! counter.

use md5::{Digest, Md5};
use spool_proto::TupleKind;
use uuid::Uuid;

/// Base request id for one `(game, kind, thread)` stream.
#[must_use]
pub fn base_request_id(game_id: &str, kind: TupleKind, thread_index: u32) -> Uuid {
    let digest = Md5::new()
        .chain_update(game_id.as_bytes())
        .chain_update(kind.label().as_bytes())
        .chain_update(thread_index.to_string().as_bytes())
        .finalize();
    uuid::Builder::from_md5_bytes(digest.into()).into_uuid()
}

/// Request id for one fetch cycle within a stream.
#[must_use]
pub fn cycle_request_id(base: Uuid, cycle: u64) -> Uuid {
    let digest = Md5::new()
        .chain_update(base.hyphenated().to_string().as_bytes())
        .chain_update(cycle.to_string().as_bytes())
        .finalize();
    uuid::Builder::from_md5_bytes(digest.into()).into_uuid()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use spool_proto::{PreprocessingName, Protocol};

    use super::*;

    fn kind() -> TupleKind {
        TupleKind { protocol: Protocol::Prime, name: PreprocessingName::Triples }
    }

    #[test]
    fn ids_are_reproducible() {
        let a = base_request_id("game", kind(), 3);
        let b = base_request_id("game", kind(), 3);
        assert_eq!(a, b);
        assert_eq!(cycle_request_id(a, 7), cycle_request_id(b, 7));
    }

    #[test]
    fn streams_get_distinct_ids() {
        let triples = base_request_id("game", kind(), 0);
        let other_thread = base_request_id("game", kind(), 1);
        let other_game = base_request_id("game2", kind(), 0);
        assert_ne!(triples, other_thread);
        assert_ne!(triples, other_game);
    }

    proptest! {
        /// Cycle ids are a pure function of `(base, cycle)` and change with
        /// the cycle counter.
        #[test]
        fn cycle_ids_are_pure(thread in 0u32..8, cycle in 0u64..1000) {
            let base = base_request_id("game", kind(), thread);
            prop_assert_eq!(cycle_request_id(base, cycle), cycle_request_id(base, cycle));
            prop_assert_ne!(cycle_request_id(base, cycle), cycle_request_id(base, cycle + 1));
        }
    }
}
