//! Deadline-bounded writer over one named FIFO.

use std::{io, path::PathBuf, time::Duration};

use tokio::{io::AsyncWriteExt, sync::watch, time::timeout};

use crate::{
    error::StreamError,
    fs::FilesystemOps,
};

/// Result of [`PipeWriter::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A reader attached and the FIFO is writable.
    Opened,
    /// The terminate signal fired before any reader attached.
    Shutdown,
}

/// Write-only handle to one named FIFO.
///
/// Created entries are world-writable FIFOs (`0666`); any stale entry at the
/// path is removed first. Writes carry a per-call deadline so a stalled
/// reader cannot wedge the streamer: a deadline expiry consumes nothing and
/// simply reports zero bytes.
pub struct PipeWriter<F: FilesystemOps> {
    fs: F,
    path: PathBuf,
    write_deadline: Duration,
    writer: Option<F::Writer>,
}

impl<F: FilesystemOps> PipeWriter<F> {
    /// Create the FIFO at `path`, replacing any pre-existing entry.
    ///
    /// # Errors
    ///
    /// `StreamError::Fifo` if the unlink fails for a reason other than the
    /// entry being absent, or if the FIFO cannot be created.
    pub fn create(fs: F, path: PathBuf, write_deadline: Duration) -> Result<Self, StreamError> {
        match fs.unlink(&path) {
            Ok(()) => {},
            Err(e) if e.kind() == io::ErrorKind::NotFound => {},
            Err(e) => return Err(StreamError::fifo(&path, "unlink", e)),
        }
        fs.mkfifo(&path).map_err(|e| StreamError::fifo(&path, "create", e))?;
        Ok(Self { fs, path, write_deadline, writer: None })
    }

    /// Path of the FIFO.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Open the FIFO write-only, blocking until a reader attaches or the
    /// terminate signal fires.
    ///
    /// # Errors
    ///
    /// `StreamError::Fifo` if the open fails for a reason other than a
    /// missing reader.
    pub async fn open(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<OpenOutcome, StreamError> {
        if *shutdown.borrow() {
            return Ok(OpenOutcome::Shutdown);
        }

        tokio::select! {
            opened = self.fs.open_writer(&self.path) => {
                let writer = opened.map_err(|e| StreamError::fifo(&self.path, "open", e))?;
                self.writer = Some(writer);
                Ok(OpenOutcome::Opened)
            },
            () = wait_for_shutdown(&mut shutdown) => Ok(OpenOutcome::Shutdown),
        }
    }

    /// Write as much of `data` as the deadline allows.
    ///
    /// Returns the number of bytes consumed; zero when the deadline expired
    /// before the reader freed any pipe capacity.
    ///
    /// # Errors
    ///
    /// - `StreamError::BrokenPipe` once the reader has closed.
    /// - `StreamError::Fifo` for any other write failure, or if the FIFO
    ///   was never opened.
    pub async fn write(&mut self, data: &[u8]) -> Result<usize, StreamError> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            StreamError::fifo(&self.path, "write", io::Error::other("fifo is not open"))
        })?;

        match timeout(self.write_deadline, writer.write(data)).await {
            Ok(Ok(written)) => Ok(written),
            Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => Err(StreamError::BrokenPipe),
            Ok(Err(e)) => Err(StreamError::fifo(&self.path, "write", e)),
            Err(_elapsed) => Ok(0),
        }
    }

    /// Close the writable end. The FIFO entry itself stays in place.
    pub fn close(&mut self) {
        self.writer = None;
    }
}

/// Resolve once the shutdown flag turns true; never resolves if the sender
/// is gone.
pub(crate) async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
