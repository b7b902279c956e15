//! Activation request and result documents.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// How the engine's output leaves the worker.
///
/// The type is closed: once an activation is constructed, its mode is one of
/// the three known ones. A request carrying a missing or unknown mode
/// spelling is rejected as [`FeedError::BadRequest`] at the boundary where
/// the string is parsed — [`OutputMode::from_str`] for callers assembling
/// activations by hand, serde for whole activation documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputMode {
    /// Open the result: decode field elements to decimal integers.
    Plaintext,
    /// Return the raw secret shares, one per result chunk.
    SecretShare,
    /// Concatenate the shares and persist them as a new secret under the
    /// game id.
    StoredShare,
}

impl FromStr for OutputMode {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PLAINTEXT" => Ok(Self::Plaintext),
            "SECRET_SHARE" => Ok(Self::SecretShare),
            "STORED_SHARE" => Ok(Self::StoredShare),
            other => Err(FeedError::BadRequest(format!("unknown output mode: {other:?}"))),
        }
    }
}

/// Where the shares pushed to the engine come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputSource {
    /// Secret ids resolved through the secret store; subject to the policy
    /// check.
    Stored(Vec<String>),
    /// Base64 share blobs carried inline in the request; no store lookup,
    /// no policy check.
    Inline(Vec<String>),
}

/// One request to run a computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    /// Identifier of the computation; doubles as the id of a stored result.
    pub game_id: String,

    /// Program identifier, the policy subject.
    pub program: String,

    /// Input shares.
    pub input: InputSource,

    /// Output handling.
    pub output: OutputMode,
}

/// Input metadata handed to the policy oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationInput {
    /// Id of the secret in the store.
    pub secret_id: String,

    /// Owner recorded on the secret.
    pub owner: String,

    /// Access policy recorded on the secret.
    pub access_policy: String,
}

/// Result document returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedResult {
    /// Decoded engine output: decimal integers, share blobs, or the id of
    /// the stored result, depending on the output mode.
    pub response: Vec<String>,
}

impl FeedResult {
    /// Serialize to the JSON document handed back over the wire.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` failures.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
