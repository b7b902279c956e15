//! Client contract for the secret store.
//!
//! Secrets are base64 share blobs with free-form tags. The worker reads
//! input secrets (and their `owner`/`accessPolicy` tags for the policy
//! check) and writes one result secret per stored-share activation. The
//! HTTP client implementing the contract lives in the enclosing service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tag key carrying a secret's owner.
pub const OWNER_TAG: &str = "owner";

/// Tag key carrying a secret's access policy.
pub const ACCESS_POLICY_TAG: &str = "accessPolicy";

/// Tag key linking a stored result to its computation.
pub const GAME_ID_TAG: &str = "gameID";

/// Failure reported by a secret store implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("secret store failed: {message}")]
pub struct StoreError {
    /// Human-readable failure description.
    pub message: String,
}

impl StoreError {
    /// Wrap a failure message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Free-form metadata attached to a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
    /// Value type; empty means unspecified and is normalized to `"STRING"`
    /// before persisting.
    #[serde(default)]
    pub value_type: String,
}

impl Tag {
    /// String-typed tag.
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into(), value_type: "STRING".to_string() }
    }

    /// Normalize an unspecified value type to `"STRING"`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.value_type.is_empty() {
            self.value_type = "STRING".to_string();
        }
        self
    }
}

/// One secret in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretShare {
    /// Store-wide identifier.
    pub id: String,
    /// Base64 of the share bytes.
    pub data: String,
    /// Attached metadata.
    pub tags: Vec<Tag>,
}

impl SecretShare {
    /// Value of the first tag with the given key, if any.
    #[must_use]
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags.iter().find(|t| t.key == key).map(|t| t.value.as_str())
    }
}

/// Remote secret store.
#[async_trait]
pub trait SecretStore: Send + Sync + 'static {
    /// Fetch one secret on behalf of a program.
    async fn get(&self, id: &str, program: &str) -> Result<SecretShare, StoreError>;

    /// Persist a new secret.
    async fn create(&self, share: SecretShare) -> Result<(), StoreError>;
}
