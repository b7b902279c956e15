//! Dialing abstraction for the engine connection.
//!
//! The carrier never retries; whatever resilience a deployment wants is bound
//! in through a [`Dialer`] at construction time. [`RetryDialer`] is the
//! production implementation: a fixed number of attempts with capped
//! exponential backoff.

use std::{io, time::Duration};

use async_trait::async_trait;
use tokio::net::TcpStream;

/// Opens the TCP connection to the engine.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Dial `host:port` and return a connected stream.
    async fn dial(&self, host: &str, port: u16) -> io::Result<TcpStream>;
}

/// Dialer with a bounded number of attempts and capped exponential backoff.
///
/// The engine process is started alongside the worker, so the first dial
/// commonly races the engine's listen socket; a short backoff absorbs that
/// window.
#[derive(Debug, Clone)]
pub struct RetryDialer {
    /// Total dial attempts before giving up.
    pub attempts: u32,
    /// Delay before the second attempt; doubles per attempt.
    pub initial_backoff: Duration,
    /// Upper bound on the per-attempt delay.
    pub max_backoff: Duration,
}

impl Default for RetryDialer {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

#[async_trait]
impl Dialer for RetryDialer {
    async fn dial(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        let mut backoff = self.initial_backoff;
        let mut last_error = io::Error::other("dialer configured with zero attempts");

        for attempt in 1..=self.attempts.max(1) {
            match TcpStream::connect((host, port)).await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    tracing::debug!(attempt, %e, "engine dial attempt failed");
                    last_error = e;
                },
            }
            if attempt < self.attempts {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(self.max_backoff);
            }
        }

        Err(last_error)
    }
}
