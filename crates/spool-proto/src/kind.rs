//! The tuple taxonomy and FIFO naming scheme.
//!
//! A tuple kind is the pair of an arithmetic domain (prime field or binary
//! field) and a preprocessing family. Each kind streamed for a computation
//! owns one FIFO per engine thread, named
//! `"<Name>-<shorthand>-P<player>-T<thread>"`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    errors::ProtocolError,
    parcel::SHARE_BLOCK,
};

/// Arithmetic domain a tuple belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// Integers modulo a prime (`gfp`).
    Prime,
    /// Polynomials over GF(2) (`gf2n`).
    Binary,
}

impl Protocol {
    /// Single-character shorthand used in FIFO file names.
    #[must_use]
    pub fn shorthand(self) -> &'static str {
        match self {
            Self::Prime => "p",
            Self::Binary => "2",
        }
    }
}

impl FromStr for Protocol {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "p" | "gfp" => Ok(Self::Prime),
            "2" | "gf2n" => Ok(Self::Binary),
            other => Err(ProtocolError::UnsupportedProtocol(other.to_string())),
        }
    }
}

/// Preprocessing family a tuple belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreprocessingName {
    /// Random bits.
    Bits,
    /// Input masks.
    Inputs,
    /// Inverse pairs `(a, a⁻¹)`.
    Inverses,
    /// Square pairs `(a, a²)`.
    Squares,
    /// Beaver triples `(a, b, ab)`.
    Triples,
}

impl PreprocessingName {
    /// All preprocessing families.
    pub const ALL: [Self; 5] =
        [Self::Bits, Self::Inputs, Self::Inverses, Self::Squares, Self::Triples];

    /// Number of shares in one tuple of this family.
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Self::Bits | Self::Inputs => 1,
            Self::Inverses | Self::Squares => 2,
            Self::Triples => 3,
        }
    }

    /// File-name component for this family.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bits => "Bits",
            Self::Inputs => "Inputs",
            Self::Inverses => "Inverses",
            Self::Squares => "Squares",
            Self::Triples => "Triples",
        }
    }
}

/// One streamable tuple kind: a preprocessing family in a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TupleKind {
    /// Arithmetic domain.
    pub protocol: Protocol,
    /// Preprocessing family.
    pub name: PreprocessingName,
}

impl TupleKind {
    /// Every `(family, domain)` combination.
    pub const ALL: [Self; 10] = [
        Self { protocol: Protocol::Prime, name: PreprocessingName::Bits },
        Self { protocol: Protocol::Prime, name: PreprocessingName::Inputs },
        Self { protocol: Protocol::Prime, name: PreprocessingName::Inverses },
        Self { protocol: Protocol::Prime, name: PreprocessingName::Squares },
        Self { protocol: Protocol::Prime, name: PreprocessingName::Triples },
        Self { protocol: Protocol::Binary, name: PreprocessingName::Bits },
        Self { protocol: Protocol::Binary, name: PreprocessingName::Inputs },
        Self { protocol: Protocol::Binary, name: PreprocessingName::Inverses },
        Self { protocol: Protocol::Binary, name: PreprocessingName::Squares },
        Self { protocol: Protocol::Binary, name: PreprocessingName::Triples },
    ];

    /// Number of shares in one tuple of this kind.
    #[must_use]
    pub fn arity(self) -> usize {
        self.name.arity()
    }

    /// Size in bytes of one tuple of this kind.
    #[must_use]
    pub fn tuple_bytes(self) -> usize {
        self.arity() * SHARE_BLOCK
    }

    /// Canonical label, e.g. `"Triples-p"`.
    ///
    /// Used both as the FIFO name prefix and as the kind component of
    /// request-id derivation, so it must agree across cooperating players.
    #[must_use]
    pub fn label(self) -> String {
        format!("{}-{}", self.name.as_str(), self.protocol.shorthand())
    }

    /// FIFO file name for this kind on a given player and engine thread.
    #[must_use]
    pub fn fifo_name(self, player_id: u32, thread_index: u32) -> String {
        format!("{}-P{player_id}-T{thread_index}", self.label())
    }
}

impl fmt::Display for TupleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_names_are_partitioned() {
        let kind = TupleKind { protocol: Protocol::Prime, name: PreprocessingName::Triples };
        assert_eq!(kind.fifo_name(0, 1), "Triples-p-P0-T1");

        let binary = TupleKind { protocol: Protocol::Binary, name: PreprocessingName::Bits };
        assert_eq!(binary.fifo_name(2, 0), "Bits-2-P2-T0");
    }

    #[test]
    fn arity_matches_family() {
        assert_eq!(PreprocessingName::Bits.arity(), 1);
        assert_eq!(PreprocessingName::Inputs.arity(), 1);
        assert_eq!(PreprocessingName::Inverses.arity(), 2);
        assert_eq!(PreprocessingName::Squares.arity(), 2);
        assert_eq!(PreprocessingName::Triples.arity(), 3);
    }

    #[test]
    fn all_kinds_are_distinct() {
        let mut labels: Vec<_> = TupleKind::ALL.iter().map(|k| k.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), 10);
    }

    #[test]
    fn protocol_parses_both_spellings() {
        assert_eq!("gfp".parse::<Protocol>().unwrap(), Protocol::Prime);
        assert_eq!("2".parse::<Protocol>().unwrap(), Protocol::Binary);
        assert!(matches!(
            "gf256".parse::<Protocol>(),
            Err(ProtocolError::UnsupportedProtocol(_))
        ));
    }
}
