//! Client contract for the randomness service.
//!
//! The worker pulls correlated randomness in batches; each batch is a list
//! of tuples, each tuple a list of shares, each share a base64 value/MAC
//! pair. The HTTP client implementing this trait lives in the enclosing
//! service; this crate only consumes the contract (and ships an in-memory
//! double for tests, see [`crate::MemoryTupleSource`]).

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use spool_proto::TupleKind;
use uuid::Uuid;

use crate::error::SourceError;

/// One party's portion of a secret-shared value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    /// Base64 of the share's field element.
    pub value: String,
    /// Base64 of the share's MAC.
    pub mac: String,
}

/// A bundle of correlated shares (e.g. one Beaver triple).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuple {
    /// The tuple's shares; length equals the kind's arity.
    pub shares: Vec<Share>,
}

/// One delivery from the randomness service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleBatch {
    /// Tuples in delivery order.
    pub tuples: Vec<Tuple>,
}

impl TupleBatch {
    /// Flatten the batch into the raw byte stream the engine consumes:
    /// every share's value then MAC, tuples back to back, no delimiters.
    ///
    /// # Errors
    ///
    /// `SourceError` if any blob is not valid base64; a batch the service
    /// delivered undecodable is treated as a service fault.
    pub fn into_bytes(self) -> Result<Vec<u8>, SourceError> {
        let mut bytes = Vec::new();
        for tuple in &self.tuples {
            for share in &tuple.shares {
                let value = BASE64.decode(&share.value).map_err(|e| {
                    SourceError::new(format!("share value is not valid base64: {e}"))
                })?;
                let mac = BASE64.decode(&share.mac).map_err(|e| {
                    SourceError::new(format!("share mac is not valid base64: {e}"))
                })?;
                bytes.extend_from_slice(&value);
                bytes.extend_from_slice(&mac);
            }
        }
        Ok(bytes)
    }
}

/// Remote randomness service.
#[async_trait]
pub trait TupleSource: Send + Sync + 'static {
    /// Fetch `count` tuples of `kind` under the given request id.
    ///
    /// Cooperating players issue the same deterministic `request_id`
    /// sequence per stream so the service can serve matching shares to each
    /// of them.
    async fn get_tuples(
        &self,
        count: usize,
        kind: TupleKind,
        request_id: Uuid,
    ) -> Result<TupleBatch, SourceError>;
}
