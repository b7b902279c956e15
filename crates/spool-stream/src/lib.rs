//! Tuple streaming into the engine's preprocessing FIFOs.
//!
//! For every `(tuple kind, engine thread)` pair one [`TupleStreamer`] owns a
//! named FIFO: it writes the domain file header, then an unbounded stream of
//! raw tuple bytes fetched batch-by-batch from the randomness service. The
//! engine reads the FIFO for as long as the computation runs and closes it
//! when done; the resulting broken pipe is the streamer's normal exit.
//!
//! Task shape per streamer: a prefetcher and a writer, coupled by two
//! one-slot channels (fetch signal and batch hand-off) so that at most one
//! batch is ever in flight and at most one sits in memory besides the buffer
//! currently being drained.

pub mod error;
pub mod fs;
pub mod memory;
pub mod pipe;
pub mod request_id;
pub mod source;
pub mod streamer;

pub use error::{SourceError, StreamError};
pub use fs::{FilesystemOps, OsFilesystem};
pub use memory::MemoryTupleSource;
pub use pipe::{OpenOutcome, PipeWriter};
pub use source::{Share, Tuple, TupleBatch, TupleSource};
pub use streamer::{StreamStats, StreamerConfig, StreamerHandle, TupleStreamer, start_for_game};
