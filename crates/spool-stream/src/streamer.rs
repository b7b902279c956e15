//! Per-(kind, thread) tuple streamer.
//!
//! One streamer owns one FIFO for the lifetime of one computation. Two tasks
//! cooperate through two one-slot channels:
//!
//! ```text
//!              fetch signal (cap 1)
//!        ┌────────────────────────────┐
//!        ▼                            │
//! ┌────────────┐  batch (cap 1)  ┌────────┐  write   ┌──────┐
//! │ prefetcher │────────────────>│ writer │─────────>│ FIFO │
//! └────────────┘                 └────────┘          └──────┘
//! ```
//!
//! The writer seeds one fetch signal, drains its buffer into the FIFO, and
//! re-signals after taking each batch, so at most one fetch is in flight and
//! at most one batch is parked in the channel. The prefetcher derives one
//! deterministic request id per cycle; cooperating players replay the same
//! sequence and receive matching shares.
//!
//! A broken pipe on write means the engine finished and closed the reader:
//! the streamer exits cleanly and reports how many payload bytes it provided
//! and how many it fetched but never delivered.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use uuid::Uuid;

use serde::{Deserialize, Serialize};
use spool_proto::{ProtocolConfig, TupleKind, fileheader::tuple_file_header};

use crate::{
    error::StreamError,
    fs::FilesystemOps,
    pipe::{OpenOutcome, PipeWriter, wait_for_shutdown},
    request_id::{base_request_id, cycle_request_id},
    source::{TupleBatch, TupleSource},
};

/// Pause between retries after a non-fatal write failure.
const WRITE_RETRY_PAUSE: Duration = Duration::from_millis(50);

/// Streaming parameters shared by all streamers of one worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamerConfig {
    /// Directory holding this player's FIFOs.
    pub data_dir: std::path::PathBuf,

    /// Tuples requested per fetch cycle.
    pub stock_size: usize,

    /// Engine threads to feed; one streamer per kind and thread.
    pub thread_count: u32,

    /// Per-write deadline on the FIFO; normally the protocol's computation
    /// timeout.
    pub write_deadline: Duration,
}

/// Byte accounting reported when a streamer exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamStats {
    /// Payload bytes the reader consumed, excluding the file header.
    pub provided_bytes: u64,

    /// Bytes fetched and decoded but never written: the unwritten tail of
    /// the buffer plus any batch still parked in the hand-off channel.
    pub discarded_bytes: u64,
}

/// Running streamer: join it to collect the exit accounting.
pub struct StreamerHandle {
    kind: TupleKind,
    thread_index: u32,
    writer: JoinHandle<Result<StreamStats, StreamError>>,
    prefetcher: JoinHandle<()>,
}

impl StreamerHandle {
    /// Tuple kind this streamer feeds.
    #[must_use]
    pub fn kind(&self) -> TupleKind {
        self.kind
    }

    /// Engine thread this streamer feeds.
    #[must_use]
    pub fn thread_index(&self) -> u32 {
        self.thread_index
    }

    /// Wait for the streamer to exit and collect its accounting.
    ///
    /// # Errors
    ///
    /// - `StreamError::Source` if a fetch failed.
    /// - `StreamError::Fifo` if the FIFO could not be opened, or a write
    ///   failed in a way that is neither a broken pipe nor retryable.
    /// - `StreamError::Task` if the writer task panicked.
    pub async fn join(self) -> Result<StreamStats, StreamError> {
        let result = match self.writer.await {
            Ok(result) => result,
            Err(e) => Err(StreamError::Task(e.to_string())),
        };
        self.prefetcher.abort();
        result
    }
}

/// Streamer for one `(kind, thread)` pair of one computation.
pub struct TupleStreamer<F: FilesystemOps> {
    game_id: String,
    kind: TupleKind,
    thread_index: u32,
    protocol: Arc<ProtocolConfig>,
    config: StreamerConfig,
    source: Arc<dyn TupleSource>,
    fs: F,
}

impl<F: FilesystemOps> TupleStreamer<F> {
    /// Describe a streamer; nothing touches the filesystem until
    /// [`TupleStreamer::start`].
    pub fn new(
        game_id: impl Into<String>,
        kind: TupleKind,
        thread_index: u32,
        protocol: Arc<ProtocolConfig>,
        config: StreamerConfig,
        source: Arc<dyn TupleSource>,
        fs: F,
    ) -> Self {
        Self { game_id: game_id.into(), kind, thread_index, protocol, config, source, fs }
    }

    /// FIFO path this streamer will own.
    #[must_use]
    pub fn fifo_path(&self) -> std::path::PathBuf {
        self.config
            .data_dir
            .join(self.kind.fifo_name(self.protocol.player_id, self.thread_index))
    }

    /// Create the FIFO and spawn the prefetcher/writer pair.
    ///
    /// The returned handle resolves when the engine closes the reader, the
    /// terminate signal fires, or a fetch fails.
    ///
    /// # Errors
    ///
    /// `StreamError::Fifo` if the FIFO cannot be created.
    pub fn start(self, shutdown: watch::Receiver<bool>) -> Result<StreamerHandle, StreamError> {
        let path = self.fifo_path();
        let pipe = PipeWriter::create(self.fs.clone(), path, self.config.write_deadline)?;
        let header = tuple_file_header(&self.protocol, self.kind.protocol);

        let (fetch_tx, fetch_rx) = mpsc::channel::<()>(1);
        let (batch_tx, batch_rx) = mpsc::channel::<Result<Vec<u8>, StreamError>>(1);

        let base = base_request_id(&self.game_id, self.kind, self.thread_index);
        tracing::debug!(
            game_id = %self.game_id,
            kind = %self.kind,
            thread_index = self.thread_index,
            base_request_id = %base,
            "starting tuple streamer"
        );

        let prefetcher = tokio::spawn(prefetch_loop(
            Arc::clone(&self.source),
            self.kind,
            self.config.stock_size,
            base,
            fetch_rx,
            batch_tx,
            shutdown.clone(),
        ));

        let writer = tokio::spawn(write_loop(
            pipe,
            header,
            self.kind,
            self.thread_index,
            fetch_tx,
            batch_rx,
            shutdown,
        ));

        Ok(StreamerHandle {
            kind: self.kind,
            thread_index: self.thread_index,
            writer,
            prefetcher,
        })
    }
}

/// Start one streamer per `(kind, thread)` pair for a computation.
///
/// # Errors
///
/// Fails on the first FIFO that cannot be created. Streamers started before
/// the failure are detached; they stop when the shared terminate signal
/// fires, which the caller owns.
pub fn start_for_game<F: FilesystemOps>(
    game_id: &str,
    kinds: &[TupleKind],
    protocol: &Arc<ProtocolConfig>,
    config: &StreamerConfig,
    source: &Arc<dyn TupleSource>,
    fs: &F,
    shutdown: &watch::Receiver<bool>,
) -> Result<Vec<StreamerHandle>, StreamError> {
    let mut handles = Vec::with_capacity(kinds.len() * config.thread_count as usize);
    for &kind in kinds {
        for thread_index in 0..config.thread_count {
            let streamer = TupleStreamer::new(
                game_id,
                kind,
                thread_index,
                Arc::clone(protocol),
                config.clone(),
                Arc::clone(source),
                fs.clone(),
            );
            handles.push(streamer.start(shutdown.clone())?);
        }
    }
    Ok(handles)
}

async fn prefetch_loop(
    source: Arc<dyn TupleSource>,
    kind: TupleKind,
    stock_size: usize,
    base: Uuid,
    mut fetch_rx: mpsc::Receiver<()>,
    batch_tx: mpsc::Sender<Result<Vec<u8>, StreamError>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut cycle: u64 = 0;
    loop {
        let signal = tokio::select! {
            signal = fetch_rx.recv() => signal,
            () = wait_for_shutdown(&mut shutdown) => None,
        };
        if signal.is_none() {
            return;
        }

        let request_id = cycle_request_id(base, cycle);
        cycle += 1;
        tracing::trace!(%kind, %request_id, cycle, "fetching tuple batch");

        let batch = source
            .get_tuples(stock_size, kind, request_id)
            .await
            .and_then(TupleBatch::into_bytes)
            .map_err(StreamError::from);
        let failed = batch.is_err();

        if batch_tx.send(batch).await.is_err() || failed {
            return;
        }
    }
}

async fn write_loop<F: FilesystemOps>(
    mut pipe: PipeWriter<F>,
    header: Vec<u8>,
    kind: TupleKind,
    thread_index: u32,
    fetch_tx: mpsc::Sender<()>,
    mut batch_rx: mpsc::Receiver<Result<Vec<u8>, StreamError>>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<StreamStats, StreamError> {
    let header_len = header.len() as u64;
    let mut streamed: u64 = 0;
    let mut buffer = header;
    let mut pos = 0usize;

    // Overlap the first fetch with the wait for a reader.
    let _ = fetch_tx.try_send(());

    let outcome = if pipe.open(shutdown.clone()).await? == OpenOutcome::Shutdown {
        Ok(())
    } else {
        loop {
            if *shutdown.borrow() {
                break Ok(());
            }

            if pos == buffer.len() {
                let next = tokio::select! {
                    next = batch_rx.recv() => next,
                    () = wait_for_shutdown(&mut shutdown) => break Ok(()),
                };
                match next {
                    Some(Ok(bytes)) => {
                        buffer = bytes;
                        pos = 0;
                        let _ = fetch_tx.try_send(());
                    },
                    Some(Err(e)) => break Err(e),
                    // Prefetcher exited; nothing more will arrive.
                    None => break Ok(()),
                }
                continue;
            }

            match pipe.write(&buffer[pos..]).await {
                Ok(written) => {
                    pos += written;
                    streamed += written as u64;
                },
                Err(StreamError::BrokenPipe) => {
                    tracing::debug!(%kind, thread_index, "fifo reader closed, streaming done");
                    break Ok(());
                },
                Err(e) => {
                    tracing::warn!(%kind, thread_index, error = %e, "fifo write failed, retrying");
                    tokio::time::sleep(WRITE_RETRY_PAUSE).await;
                },
            }
        }
    };

    pipe.close();

    let mut discarded = (buffer.len() - pos) as u64;
    if let Ok(Ok(parked)) = batch_rx.try_recv() {
        discarded += parked.len() as u64;
    }
    let provided = streamed.saturating_sub(header_len);

    tracing::info!(
        %kind,
        thread_index,
        provided_bytes = provided,
        discarded_bytes = discarded,
        "tuple streamer finished"
    );

    outcome.map(|()| StreamStats { provided_bytes: provided, discarded_bytes: discarded })
}
