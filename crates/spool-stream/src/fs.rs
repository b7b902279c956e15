//! Filesystem capability behind the FIFO writer.
//!
//! The streamer needs exactly three filesystem operations: unlink a stale
//! entry, create a FIFO, and open its writable end. They are isolated behind
//! [`FilesystemOps`] so tests can point the whole streaming stack at a
//! scratch directory (or a fake) without touching the production namespace.

use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use nix::sys::stat::Mode;
use tokio::{io::AsyncWrite, net::unix::pipe};

/// Filesystem operations the FIFO writer depends on.
pub trait FilesystemOps: Clone + Send + Sync + 'static {
    /// Writable end produced by [`FilesystemOps::open_writer`].
    type Writer: AsyncWrite + Send + Unpin;

    /// Remove the filesystem entry at `path`.
    ///
    /// # Errors
    ///
    /// Propagates the underlying error, including `NotFound`; the caller
    /// decides whether a missing entry matters.
    fn unlink(&self, path: &Path) -> io::Result<()>;

    /// Create a FIFO at `path` with mode `0666`.
    ///
    /// # Errors
    ///
    /// Propagates the underlying error.
    fn mkfifo(&self, path: &Path) -> io::Result<()>;

    /// Open the FIFO write-only, waiting until a reader has opened the
    /// other end.
    ///
    /// The returned future may be pending indefinitely when no reader ever
    /// attaches; callers run it on a task that can observe a terminate
    /// signal.
    fn open_writer(&self, path: &Path) -> impl Future<Output = io::Result<Self::Writer>> + Send;
}

/// Production [`FilesystemOps`] over the real filesystem.
///
/// `open_writer` opens the FIFO in non-blocking mode and retries on `ENXIO`
/// (no reader yet) at a fixed poll interval, which keeps the open cancellable
/// from the outside.
#[derive(Debug, Clone)]
pub struct OsFilesystem {
    /// Interval between open attempts while waiting for a reader.
    pub poll_interval: Duration,
}

impl Default for OsFilesystem {
    fn default() -> Self {
        Self { poll_interval: Duration::from_millis(20) }
    }
}

impl FilesystemOps for OsFilesystem {
    type Writer = pipe::Sender;

    fn unlink(&self, path: &Path) -> io::Result<()> {
        nix::unistd::unlink(path).map_err(io::Error::from)
    }

    fn mkfifo(&self, path: &Path) -> io::Result<()> {
        nix::unistd::mkfifo(path, Mode::from_bits_truncate(0o666)).map_err(io::Error::from)
    }

    async fn open_writer(&self, path: &Path) -> io::Result<pipe::Sender> {
        let path: PathBuf = path.to_path_buf();
        loop {
            match pipe::OpenOptions::new().open_sender(&path) {
                Ok(sender) => return Ok(sender),
                Err(e) if e.raw_os_error() == Some(nix::errno::Errno::ENXIO as i32) => {
                    tokio::time::sleep(self.poll_interval).await;
                },
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlink_missing_entry_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fs = OsFilesystem::default();
        let err = fs.unlink(&dir.path().join("absent")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn mkfifo_creates_a_pipe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipe");
        let fs = OsFilesystem::default();
        fs.mkfifo(&path).unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert!(std::os::unix::fs::FileTypeExt::is_fifo(&meta.file_type()));
    }

    #[tokio::test]
    async fn open_writer_waits_for_a_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipe");
        let fs = OsFilesystem::default();
        fs.mkfifo(&path).unwrap();

        let opener = {
            let fs = fs.clone();
            let path = path.clone();
            tokio::spawn(async move { fs.open_writer(&path).await })
        };

        // No reader yet: the open must still be pending.
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!opener.is_finished());

        let reader = pipe::OpenOptions::new().open_receiver(&path).unwrap();
        let sender = opener.await.unwrap().unwrap();
        drop(sender);
        drop(reader);
    }
}
