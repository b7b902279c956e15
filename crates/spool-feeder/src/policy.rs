//! Client contract for the policy oracle.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{activation::ActivationInput, store::Tag};

/// Failure reported by a policy oracle implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("policy oracle failed: {message}")]
pub struct PolicyError {
    /// Human-readable failure description.
    pub message: String,
}

impl PolicyError {
    /// Wrap a failure message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Wall-clock instant of the authorization decision, in both the
/// human-readable and the machine form the oracle expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionTime {
    /// RFC 3339 rendering.
    pub formatted: String,
    /// Nanoseconds since the Unix epoch.
    pub nano: i64,
}

impl ExecutionTime {
    /// Capture the current instant.
    #[must_use]
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            formatted: now.to_rfc3339(),
            nano: now.timestamp_nanos_opt().unwrap_or_default(),
        }
    }
}

/// Authorization request for one activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    /// Program identifier acting as the subject.
    pub subject: String,
    /// Inputs with their ownership metadata.
    pub inputs: Vec<ActivationInput>,
    /// When the decision is being made.
    pub time: ExecutionTime,
    /// Number of cooperating players.
    pub player_count: u32,
}

/// Request for the tags to attach to a stored result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRequest {
    /// Inputs the result was computed from.
    pub inputs: Vec<ActivationInput>,
}

/// Remote policy oracle.
#[async_trait]
pub trait PolicyOracle: Send + Sync + 'static {
    /// Whether the subject may execute over the given inputs.
    async fn can_execute(&self, request: CheckRequest) -> Result<bool, PolicyError>;

    /// Tags to attach to a result derived from the given inputs.
    async fn generate_tags(&self, request: TagRequest) -> Result<Vec<Tag>, PolicyError>;
}
