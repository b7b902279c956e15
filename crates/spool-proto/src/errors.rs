//! Error types for wire and file format handling.
//!
//! Strongly-typed errors for the codec and decoder layers. Size violations
//! carry both the expected block size and the offending length so that a
//! rejected engine response can be diagnosed from the message alone.

use thiserror::Error;

/// Convenience alias used throughout the format layer.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding engine data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Input was structurally unusable: an empty share list, a blob that is
    /// not valid base64, or a frame shorter than its length header.
    #[error("bad input: {0}")]
    BadInput(String),

    /// A share payload length is not a positive multiple of the block size.
    #[error("bad body size: expected a positive multiple of {expected}, received {received}")]
    BadBodySize {
        /// Block size the payload must divide into.
        expected: usize,
        /// Length that was actually received.
        received: usize,
    },

    /// A plaintext payload length is not a positive multiple of the field
    /// element size.
    #[error("bad word size: expected a positive multiple of {expected}, received {received}")]
    BadWordSize {
        /// Field element size the payload must divide into.
        expected: usize,
        /// Length that was actually received.
        received: usize,
    },

    /// Unknown protocol name while parsing configuration or constructing a
    /// tuple-file header.
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_size_message_names_received_length() {
        let err = ProtocolError::BadWordSize { expected: 16, received: 1 };
        assert!(err.to_string().contains("received 1"));
    }

    #[test]
    fn body_size_message_names_block_size() {
        let err = ProtocolError::BadBodySize { expected: 32, received: 33 };
        assert!(err.to_string().contains("multiple of 32"));
    }
}
