//! Error types for activation orchestration.

use spool_engine::EngineError;
use thiserror::Error;

use crate::{policy::PolicyError, store::StoreError};

/// Errors that abort an activation.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The activation named a missing or unknown output mode.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The policy oracle denied the activation or could not be consulted.
    #[error("activation not authorized: {0}")]
    Unauthorized(String),

    /// The secret store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Tag generation for the stored result failed.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// The engine channel failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
