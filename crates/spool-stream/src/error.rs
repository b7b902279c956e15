//! Error types for the streaming layer.
//!
//! A broken pipe is deliberately its own variant: the engine closing the
//! FIFO reader is how a computation normally ends, so the streamer treats it
//! as clean termination and it never crosses the crate boundary as a
//! failure.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure reported by a tuple source implementation.
///
/// The transport behind the source (HTTP client, test double) is its own
/// concern; everything surfaces here as a message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("tuple source failed: {message}")]
pub struct SourceError {
    /// Human-readable failure description.
    pub message: String,
}

impl SourceError {
    /// Wrap a failure message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Errors that can occur while streaming tuples.
#[derive(Debug, Error)]
pub enum StreamError {
    /// FIFO creation, open, or write failure.
    #[error("fifo {}: {operation} failed: {source}", path.display())]
    Fifo {
        /// FIFO path the operation targeted.
        path: PathBuf,
        /// Operation that failed (`create`, `open`, `write`).
        operation: &'static str,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The FIFO reader closed. Clean termination inside the streamer; only
    /// visible to code driving a [`crate::PipeWriter`] directly.
    #[error("fifo reader closed")]
    BrokenPipe,

    /// The randomness service failed or returned an undecodable batch.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A streamer task panicked or was aborted.
    #[error("streamer task failed: {0}")]
    Task(String),
}

impl StreamError {
    pub(crate) fn fifo(path: &std::path::Path, operation: &'static str, source: io::Error) -> Self {
        Self::Fifo { path: path.to_path_buf(), operation, source }
    }
}
