//! Wire and file formats shared by the spool worker.
//!
//! This crate is sans-I/O: it converts between the textual form of secret
//! shares (base64 blobs), the engine's length-prefixed binary frames, and the
//! tuple-file headers the engine expects at the head of each preprocessing
//! FIFO. All sockets and pipes live in `spool-engine` and `spool-stream`.
//!
//! Layers, bottom up:
//!
//! - [`parcel`] — the 32-byte share block and its length-prefixed record
//! - [`codec`] — outbound share frames and inbound result frames
//! - [`decoder`] — result conversion: share pass-through or plaintext
//!   recovery via Montgomery reduction
//! - [`kind`] — the tuple taxonomy and FIFO naming scheme
//! - [`fileheader`] — `SPDZ gfp` / `SPDZ gf2n_` preprocessing file headers
//! - [`config`] — the immutable per-computation protocol parameters

pub mod codec;
pub mod config;
pub mod decoder;
pub mod errors;
pub mod fileheader;
pub mod kind;
pub mod parcel;

pub use config::ProtocolConfig;
pub use decoder::{PlaintextDecoder, ResponseDecoder};
pub use errors::{ProtocolError, Result};
pub use kind::{PreprocessingName, Protocol, TupleKind};
pub use parcel::{FIELD_ELEMENT, LEN_HEADER, Parcel, SHARE_BLOCK};
