//! The engine carrier: one connection, one computation.
//!
//! # State machine
//!
//! ```text
//! ┌──────────────┐  connect   ┌───────────┐  close   ┌────────┐
//! │ Disconnected │───────────>│ Connected │─────────>│ Closed │
//! └──────────────┘            └───────────┘          └────────┘
//! ```
//!
//! `connect` on a connected carrier is a no-op success (the surrounding
//! orchestrator may retry); a closed carrier never reconnects. All
//! transitions happen under the carrier's mutex, which also serializes
//! `send`/`read` — the engine protocol is strictly send-then-read.
//!
//! # Handshake
//!
//! The first bytes on the socket are always the player header
//! `LE_u32(len(digits)) + ascii(player_id)`. Player 0 additionally reads the
//! engine's reply, `LE_u32(L) + L` descriptor bytes, before `connect`
//! returns.

use std::sync::Arc;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::{Mutex, watch},
};

use spool_proto::{ResponseDecoder, codec};

use crate::{dialer::Dialer, error::EngineError};

/// Lifecycle states of a carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierState {
    /// No connection yet.
    Disconnected,
    /// Handshake complete, ready to send.
    Connected,
    /// Terminal; the connection (if any) has been shut down.
    Closed,
}

/// Inspection hook for the field descriptor the engine sends to player 0.
///
/// The descriptor carries the engine's prime. Deployments that want to
/// cross-check it against their configured field install a check here; the
/// default accepts anything.
pub trait DescriptorCheck: Send + Sync {
    /// Inspect the descriptor bytes read during the player-0 handshake.
    ///
    /// # Errors
    ///
    /// Return `EngineError::DescriptorRejected` to abort the connect.
    fn check(&self, descriptor: &[u8]) -> Result<(), EngineError>;
}

/// Default [`DescriptorCheck`]: accepts any descriptor.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAnyDescriptor;

impl DescriptorCheck for AcceptAnyDescriptor {
    fn check(&self, _descriptor: &[u8]) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Resolve once the shutdown flag turns true.
///
/// A dropped sender means no shutdown can ever arrive; park forever instead
/// of resolving, so an orphaned receiver does not read as a cancellation.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

struct Inner {
    state: CarrierState,
    stream: Option<TcpStream>,
}

/// Single-use framed TCP channel to the engine.
pub struct Carrier {
    dialer: Arc<dyn Dialer>,
    descriptor_check: Arc<dyn DescriptorCheck>,
    inner: Mutex<Inner>,
}

impl Carrier {
    /// Create a disconnected carrier bound to the given dialer.
    #[must_use]
    pub fn new(dialer: Arc<dyn Dialer>) -> Self {
        Self {
            dialer,
            descriptor_check: Arc::new(AcceptAnyDescriptor),
            inner: Mutex::new(Inner { state: CarrierState::Disconnected, stream: None }),
        }
    }

    /// Replace the descriptor check applied during the player-0 handshake.
    #[must_use]
    pub fn with_descriptor_check(mut self, check: Arc<dyn DescriptorCheck>) -> Self {
        self.descriptor_check = check;
        self
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> CarrierState {
        self.inner.lock().await.state
    }

    /// Dial the engine and perform the player handshake.
    ///
    /// Idempotent while connected. The dial is raced against `shutdown`; a
    /// signal that fires first aborts the connect without leaving a
    /// half-open socket behind.
    ///
    /// # Errors
    ///
    /// - `EngineError::Closed` if the carrier was already closed.
    /// - `EngineError::Cancelled` if shutdown fired during the dial.
    /// - `EngineError::Connect` if the dialer gave up.
    /// - `EngineError::Io` if the handshake write or the player-0 reply
    ///   read failed, including a truncated reply.
    /// - `EngineError::DescriptorRejected` from the installed check.
    pub async fn connect(
        &self,
        mut shutdown: watch::Receiver<bool>,
        player_id: u32,
        host: &str,
        port: u16,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().await;
        match inner.state {
            CarrierState::Connected => return Ok(()),
            CarrierState::Closed => return Err(EngineError::Closed),
            CarrierState::Disconnected => {},
        }

        let mut stream = tokio::select! {
            dialed = self.dialer.dial(host, port) => dialed.map_err(EngineError::Connect)?,
            () = wait_for_shutdown(&mut shutdown) => return Err(EngineError::Cancelled),
        };

        // The player header must be the first bytes on the socket.
        let digits = player_id.to_string();
        let mut header = Vec::with_capacity(4 + digits.len());
        header.extend_from_slice(&(digits.len() as u32).to_le_bytes());
        header.extend_from_slice(digits.as_bytes());
        stream.write_all(&header).await?;

        if player_id == 0 {
            let len = stream.read_u32_le().await?;
            let mut descriptor = vec![0u8; len as usize];
            stream.read_exact(&mut descriptor).await?;
            self.descriptor_check.check(&descriptor)?;
        }

        tracing::debug!(player_id, host, port, "engine carrier connected");
        inner.state = CarrierState::Connected;
        inner.stream = Some(stream);
        Ok(())
    }

    /// Frame the given base64 shares and write them to the engine.
    ///
    /// # Errors
    ///
    /// - `EngineError::NotConnected` before a successful `connect`.
    /// - `EngineError::Encode` if a share fails to frame.
    /// - `EngineError::Io` on a write failure.
    pub async fn send<S: AsRef<str>>(&self, shares: &[S]) -> Result<(), EngineError> {
        let frame = codec::encode_shares(shares)?;

        let mut inner = self.inner.lock().await;
        let stream = inner.stream.as_mut().ok_or(EngineError::NotConnected)?;
        stream.write_all(&frame).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Read the engine's response and decode it.
    ///
    /// The engine writes one result frame and closes its side, so this reads
    /// to EOF before decoding.
    ///
    /// # Errors
    ///
    /// - `EngineError::NotConnected` before a successful `connect`.
    /// - `EngineError::EmptyResponse` if EOF arrived before any byte.
    /// - `EngineError::Io` on a read failure.
    /// - `EngineError::Encode` if the response frame is malformed.
    pub async fn read(
        &self,
        decoder: &ResponseDecoder,
        aggregate: bool,
    ) -> Result<Vec<String>, EngineError> {
        let mut inner = self.inner.lock().await;
        let stream = inner.stream.as_mut().ok_or(EngineError::NotConnected)?;

        let mut frame = Vec::new();
        stream.read_to_end(&mut frame).await?;
        if frame.is_empty() {
            return Err(EngineError::EmptyResponse);
        }

        Ok(codec::decode_frame(&frame, decoder, aggregate)?)
    }

    /// Shut the connection down and move to the terminal state.
    ///
    /// Idempotent. Shutdown failures are logged, never returned, so a close
    /// on an error path cannot mask the primary error.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(mut stream) = inner.stream.take()
            && let Err(e) = stream.shutdown().await
        {
            tracing::warn!(%e, "engine connection shutdown failed");
        }
        inner.state = CarrierState::Closed;
    }
}
