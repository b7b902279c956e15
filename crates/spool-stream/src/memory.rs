//! In-memory tuple source for tests and simulation.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use spool_proto::{FIELD_ELEMENT, TupleKind};
use uuid::Uuid;

use crate::{
    error::SourceError,
    source::{Share, Tuple, TupleBatch, TupleSource},
};

/// In-memory [`TupleSource`] implementation for testing and simulation.
///
/// Serves deterministic batches (every field element of batch `n` is filled
/// with the byte `n`), records every request id, and tracks how many fetches
/// were ever in flight at once so tests can assert the streamer's
/// one-fetch-at-a-time discipline. Clones share state via `Arc`.
#[derive(Clone)]
pub struct MemoryTupleSource {
    inner: Arc<Inner>,
}

struct Inner {
    fetch_delay: Duration,
    fail_after: Option<usize>,
    requests: Mutex<Vec<Uuid>>,
    served: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryTupleSource {
    /// Source that answers immediately and never fails.
    #[must_use]
    pub fn new() -> Self {
        Self::with_behavior(Duration::ZERO, None)
    }

    /// Source with an artificial per-fetch delay and an optional failure
    /// point: the `fail_after`-th fetch (zero-based) and all later ones
    /// error.
    #[must_use]
    pub fn with_behavior(fetch_delay: Duration, fail_after: Option<usize>) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetch_delay,
                fail_after,
                requests: Mutex::new(Vec::new()),
                served: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Request ids observed so far, in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned; acceptable for test code.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn requests(&self) -> Vec<Uuid> {
        self.inner.requests.lock().expect("mutex poisoned").clone()
    }

    /// Number of batches served successfully.
    #[must_use]
    pub fn served_batches(&self) -> usize {
        self.inner.served.load(Ordering::SeqCst)
    }

    /// Highest number of concurrently in-flight fetches observed.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MemoryTupleSource {
    fn default() -> Self {
        Self::new()
    }
}

struct InFlightGuard<'a>(&'a Inner);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TupleSource for MemoryTupleSource {
    #[allow(clippy::expect_used)]
    async fn get_tuples(
        &self,
        count: usize,
        kind: TupleKind,
        request_id: Uuid,
    ) -> Result<TupleBatch, SourceError> {
        let inner = &*self.inner;

        let concurrent = inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        inner.max_in_flight.fetch_max(concurrent, Ordering::SeqCst);
        let _guard = InFlightGuard(inner);

        inner.requests.lock().expect("mutex poisoned").push(request_id);

        if !inner.fetch_delay.is_zero() {
            tokio::time::sleep(inner.fetch_delay).await;
        }

        let batch_index = inner.served.load(Ordering::SeqCst);
        if let Some(limit) = inner.fail_after
            && batch_index >= limit
        {
            return Err(SourceError::new(format!("injected failure on batch {batch_index}")));
        }

        let fill = batch_index as u8;
        let blob = BASE64.encode([fill; FIELD_ELEMENT]);
        let tuples = (0..count)
            .map(|_| Tuple {
                shares: (0..kind.arity())
                    .map(|_| Share { value: blob.clone(), mac: blob.clone() })
                    .collect(),
            })
            .collect();

        inner.served.fetch_add(1, Ordering::SeqCst);
        Ok(TupleBatch { tuples })
    }
}

#[cfg(test)]
mod tests {
    use spool_proto::{PreprocessingName, Protocol};

    use super::*;

    #[tokio::test]
    async fn serves_batches_of_requested_shape() {
        let source = MemoryTupleSource::new();
        let kind = TupleKind { protocol: Protocol::Prime, name: PreprocessingName::Triples };

        let batch = source.get_tuples(4, kind, Uuid::nil()).await.unwrap();
        assert_eq!(batch.tuples.len(), 4);
        assert!(batch.tuples.iter().all(|t| t.shares.len() == 3));
        assert_eq!(batch.into_bytes().unwrap().len(), 4 * kind.tuple_bytes());
    }

    #[tokio::test]
    async fn failure_injection_trips_at_limit() {
        let source = MemoryTupleSource::with_behavior(Duration::ZERO, Some(1));
        let kind = TupleKind { protocol: Protocol::Binary, name: PreprocessingName::Bits };

        assert!(source.get_tuples(1, kind, Uuid::nil()).await.is_ok());
        assert!(source.get_tuples(1, kind, Uuid::nil()).await.is_err());
    }
}
