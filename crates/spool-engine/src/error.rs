//! Error types for the engine carrier.

use std::io;

use spool_proto::ProtocolError;
use thiserror::Error;

/// Errors that can occur while driving the engine connection.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Dialing the engine failed after all retries.
    #[error("connect to engine failed: {0}")]
    Connect(#[source] io::Error),

    /// Socket read or write failure, including a truncated handshake reply.
    #[error("engine i/o failed: {0}")]
    Io(#[from] io::Error),

    /// The engine closed the connection without sending a single byte.
    #[error("engine closed the connection without responding")]
    EmptyResponse,

    /// Outbound shares could not be framed, or the response frame was
    /// malformed.
    #[error(transparent)]
    Encode(#[from] ProtocolError),

    /// The carrier was used after `close`; a closed carrier never
    /// reconnects.
    #[error("carrier is closed")]
    Closed,

    /// The carrier is not connected.
    #[error("carrier is not connected")]
    NotConnected,

    /// A shutdown signal arrived while dialing.
    #[error("connect cancelled by shutdown")]
    Cancelled,

    /// The engine's field descriptor was rejected by the configured check.
    #[error("engine descriptor rejected: {0}")]
    DescriptorRejected(String),
}
