//! In-process fake MPC engine.
//!
//! Plays the engine's two roles for one activation:
//!
//! - TCP server on the feed port: consumes the player header, optionally
//!   sends a field descriptor (the player-0 handshake), reads one inbound
//!   share frame, writes one reply frame, closes.
//! - FIFO reader: opens each expected preprocessing FIFO, consumes its file
//!   header and a slice of tuple payload, and closes the reader once the
//!   TCP exchange is done — which is what makes the streamers finish.

use std::{io, path::PathBuf};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, unix::pipe},
    sync::watch,
    task::JoinHandle,
};

/// Bytes one FIFO reader consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FifoRead {
    /// FIFO that was read.
    pub path: PathBuf,
    /// The file header bytes.
    pub header: Vec<u8>,
    /// The tuple payload bytes that followed.
    pub payload: Vec<u8>,
}

/// Everything the fake engine observed during one activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineObservation {
    /// ASCII digits from the player header.
    pub player_digits: String,
    /// Payload of the inbound share frame.
    pub input_payload: Vec<u8>,
    /// Per-FIFO consumption, in registration order.
    pub fifo_reads: Vec<FifoRead>,
}

/// Configurable fake engine bound to an ephemeral port.
pub struct FakeEngine {
    listener: TcpListener,
    port: u16,
    descriptor: Option<Vec<u8>>,
    reply: Vec<u8>,
    fifos: Vec<(PathBuf, usize, usize)>,
}

impl FakeEngine {
    /// Bind the feed port; `reply` is the result frame written back.
    ///
    /// # Errors
    ///
    /// Propagates bind failures.
    pub async fn bind(reply: Vec<u8>) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        Ok(Self { listener, port, descriptor: None, reply, fifos: Vec::new() })
    }

    /// Feed port the engine listens on.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Send a field descriptor after the player header (player-0 handshake).
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: Vec<u8>) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    /// Also consume `header_len + payload_len` bytes from the FIFO at
    /// `path`.
    #[must_use]
    pub fn expect_fifo(mut self, path: PathBuf, header_len: usize, payload_len: usize) -> Self {
        self.fifos.push((path, header_len, payload_len));
        self
    }

    /// Run the engine side of one activation.
    pub fn start(self) -> JoinHandle<io::Result<EngineObservation>> {
        tokio::spawn(self.run())
    }

    async fn run(self) -> io::Result<EngineObservation> {
        let (close_tx, _) = watch::channel(false);

        // FIFO readers first: the engine attaches to its preprocessing
        // pipes before it accepts inputs.
        let mut readers = Vec::with_capacity(self.fifos.len());
        for (path, header_len, payload_len) in self.fifos {
            let mut close_rx = close_tx.subscribe();
            readers.push(tokio::spawn(async move {
                let mut fifo = pipe::OpenOptions::new().open_receiver(&path)?;

                let mut header = vec![0u8; header_len];
                fifo.read_exact(&mut header).await?;
                let mut payload = vec![0u8; payload_len];
                fifo.read_exact(&mut payload).await?;

                // Hold the reader open until the computation "finishes".
                let _ = close_rx.wait_for(|done| *done).await;
                drop(fifo);

                Ok::<_, io::Error>(FifoRead { path, header, payload })
            }));
        }

        let (mut sock, _) = self.listener.accept().await?;

        let digits_len = sock.read_u32_le().await?;
        let mut digits = vec![0u8; digits_len as usize];
        sock.read_exact(&mut digits).await?;
        let player_digits = String::from_utf8_lossy(&digits).to_string();

        if let Some(descriptor) = &self.descriptor {
            sock.write_u32_le(descriptor.len() as u32).await?;
            sock.write_all(descriptor).await?;
        }

        let input_len = sock.read_u32_le().await?;
        let mut input_payload = vec![0u8; input_len as usize];
        sock.read_exact(&mut input_payload).await?;

        sock.write_all(&self.reply).await?;
        sock.shutdown().await?;

        // Computation over: release the FIFO readers.
        let _ = close_tx.send(true);

        let mut fifo_reads = Vec::with_capacity(readers.len());
        for reader in readers {
            fifo_reads.push(reader.await.map_err(io::Error::other)??);
        }

        Ok(EngineObservation { player_digits, input_payload, fifo_reads })
    }
}
