//! Integration tests driving streamers against real FIFOs in a tempdir.
//!
//! The reader side plays the engine: it opens the FIFO, consumes the file
//! header and some tuple bytes, and closes when "the computation finishes".

use std::{sync::Arc, time::Duration};

use spool_proto::{PreprocessingName, Protocol, ProtocolConfig, TupleKind};
use spool_stream::{
    MemoryTupleSource, StreamError, StreamStats, StreamerConfig, StreamerHandle, TupleSource,
    TupleStreamer, fs::OsFilesystem,
};
use tokio::{io::AsyncReadExt, net::unix::pipe, sync::watch};

const GFP_HEADER_LEN: usize = 8 + 29;

fn protocol() -> Arc<ProtocolConfig> {
    Arc::new(ProtocolConfig {
        prime: "198766463529478683931867765928436695041".parse().unwrap(),
        r_inv: "133854242216446749056083838363708373830".parse().unwrap(),
        gf2n_bit_length: 40,
        gf2n_storage_size: 8,
        player_id: 0,
        player_count: 2,
        computation_timeout: Duration::from_secs(5),
        state_timeout: Duration::from_secs(60),
    })
}

fn triples() -> TupleKind {
    TupleKind { protocol: Protocol::Prime, name: PreprocessingName::Triples }
}

fn streamer_config(dir: &tempfile::TempDir, stock_size: usize) -> StreamerConfig {
    StreamerConfig {
        data_dir: dir.path().to_path_buf(),
        stock_size,
        thread_count: 1,
        write_deadline: Duration::from_millis(100),
    }
}

fn start(
    dir: &tempfile::TempDir,
    source: &MemoryTupleSource,
    stock_size: usize,
    shutdown: &watch::Receiver<bool>,
) -> (StreamerHandle, std::path::PathBuf) {
    let source: Arc<dyn TupleSource> = Arc::new(source.clone());
    let streamer = TupleStreamer::new(
        "game",
        triples(),
        0,
        protocol(),
        streamer_config(dir, stock_size),
        source,
        OsFilesystem::default(),
    );
    let path = streamer.fifo_path();
    let handle = streamer.start(shutdown.clone()).unwrap();
    (handle, path)
}

#[tokio::test]
async fn streams_header_then_tuple_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let source = MemoryTupleSource::new();
    let (tx, rx) = watch::channel(false);

    let (handle, path) = start(&dir, &source, 4, &rx);

    let mut reader = pipe::OpenOptions::new().open_receiver(&path).unwrap();

    let mut header = [0u8; GFP_HEADER_LEN];
    reader.read_exact(&mut header).await.unwrap();
    assert_eq!(&header[..8], &29u64.to_le_bytes());
    assert_eq!(&header[8..16], b"SPDZ gfp");

    // One batch: 4 triples of 3 shares, value and MAC each 16 bytes,
    // all filled with the batch index.
    let batch_len = 4 * 3 * 32;
    let mut batch = vec![0u8; batch_len];
    reader.read_exact(&mut batch).await.unwrap();
    assert!(batch.iter().all(|&b| b == 0));

    // Engine done: close the reader and expect a clean exit.
    drop(reader);
    let stats = handle.join().await.unwrap();
    assert!(stats.provided_bytes >= batch_len as u64);

    drop(tx);
}

#[tokio::test]
async fn terminate_before_reader_attaches_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let source = MemoryTupleSource::new();
    let (tx, rx) = watch::channel(false);

    let (handle, _path) = start(&dir, &source, 4, &rx);

    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(true).unwrap();

    let stats = handle.join().await.unwrap();
    assert_eq!(stats.provided_bytes, 0);
}

#[tokio::test]
async fn fetch_failure_terminates_the_streamer() {
    let dir = tempfile::tempdir().unwrap();
    let source = MemoryTupleSource::with_behavior(Duration::ZERO, Some(0));
    let (_tx, rx) = watch::channel(false);

    let (handle, path) = start(&dir, &source, 4, &rx);

    // Attach a reader so the streamer gets past the open.
    let reader = pipe::OpenOptions::new().open_receiver(&path).unwrap();

    let err = handle.join().await.unwrap_err();
    assert!(matches!(err, StreamError::Source(_)));
    drop(reader);
}

#[tokio::test]
async fn at_most_one_fetch_in_flight() {
    let dir = tempfile::tempdir().unwrap();
    let source = MemoryTupleSource::with_behavior(Duration::from_millis(15), None);
    let (tx, rx) = watch::channel(false);

    let (handle, path) = start(&dir, &source, 4, &rx);

    let mut reader = pipe::OpenOptions::new().open_receiver(&path).unwrap();
    let mut sink = vec![0u8; 4 * 3 * 32];
    reader.read_exact(&mut sink[..GFP_HEADER_LEN]).await.unwrap();
    for _ in 0..4 {
        reader.read_exact(&mut sink).await.unwrap();
    }
    drop(reader);

    handle.join().await.unwrap();
    assert!(source.served_batches() >= 4);
    assert_eq!(source.max_in_flight(), 1);

    drop(tx);
}

#[tokio::test]
async fn prefetch_depth_is_bounded_and_discards_are_accounted() {
    let dir = tempfile::tempdir().unwrap();
    let source = MemoryTupleSource::new();
    let (tx, rx) = watch::channel(false);

    // Large batches: ~28.8 KB each against the 64 KB pipe buffer.
    let (handle, path) = start(&dir, &source, 300, &rx);

    // Open the reader but never read: the writer must stall, not prefetch
    // unboundedly.
    let reader = pipe::OpenOptions::new().open_receiver(&path).unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(source.served_batches() <= 6, "served {}", source.served_batches());

    tx.send(true).unwrap();
    let stats: StreamStats = handle.join().await.unwrap();
    assert!(stats.discarded_bytes > 0);
    drop(reader);
}

#[tokio::test]
async fn cooperating_streamers_replay_the_same_request_ids() {
    let (tx, rx) = watch::channel(false);

    let mut observed = Vec::new();
    for _ in 0..2 {
        let dir = tempfile::tempdir().unwrap();
        let source = MemoryTupleSource::new();
        let (handle, path) = start(&dir, &source, 4, &rx);

        let mut reader = pipe::OpenOptions::new().open_receiver(&path).unwrap();
        let mut sink = vec![0u8; GFP_HEADER_LEN + 2 * 4 * 3 * 32];
        reader.read_exact(&mut sink).await.unwrap();
        drop(reader);

        handle.join().await.unwrap();
        observed.push(source.requests());
    }

    let common = observed[0].len().min(observed[1].len());
    assert!(common >= 2);
    assert_eq!(observed[0][..common], observed[1][..common]);

    drop(tx);
}
