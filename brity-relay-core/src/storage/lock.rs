//! Storage lock for serializing mutations.
//!
//! An OS advisory exclusive lock (`flock` on Unix, `LockFileEx` on Windows)
//! held on a sibling lock file. Every acquisition opens its own handle, so two
//! tasks in one process exclude each other the same way two processes do.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{CoreError, CoreResult};

/// A file-backed lock that serializes account mutations across processes.
#[derive(Debug, Clone)]
pub struct StoreLock {
    path: PathBuf,
    timeout: Duration,
    retry_interval: Duration,
}

/// Guard that holds the exclusive lock for its lifetime.
#[derive(Debug)]
pub struct StoreLockGuard {
    file: File,
}

impl StoreLock {
    pub fn new(path: impl Into<PathBuf>, timeout: Duration, retry_interval: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
            retry_interval,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> CoreResult<File> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| map_io_err(&self.path, &e))?;
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| map_io_err(&self.path, &e))
    }

    /// Attempts to acquire the exclusive lock without waiting.
    ///
    /// Returns `Ok(None)` when another holder has it.
    pub fn try_acquire(&self) -> CoreResult<Option<StoreLockGuard>> {
        let file = self.open()?;
        if try_lock_exclusive(&file).map_err(|e| map_io_err(&self.path, &e))? {
            Ok(Some(StoreLockGuard { file }))
        } else {
            Ok(None)
        }
    }

    /// Acquires the exclusive lock, retrying until the configured timeout.
    ///
    /// # Errors
    ///
    /// `StoreBusy` when the lock is still held elsewhere at the deadline.
    pub async fn acquire(&self) -> CoreResult<StoreLockGuard> {
        let file = self.open()?;
        let started = Instant::now();

        loop {
            if try_lock_exclusive(&file).map_err(|e| map_io_err(&self.path, &e))? {
                log::debug!("Acquired store lock {:?}", self.path);
                return Ok(StoreLockGuard { file });
            }

            let waited = started.elapsed();
            if waited >= self.timeout {
                return Err(CoreError::StoreBusy {
                    waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                });
            }
            tokio::time::sleep(self.retry_interval.min(self.timeout - waited)).await;
        }
    }
}

impl Drop for StoreLockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// `Ok(false)` when another handle holds the lock.
fn try_lock_exclusive(file: &File) -> std::io::Result<bool> {
    match FileExt::try_lock_exclusive(file) {
        Ok(()) => Ok(true),
        Err(e)
            if e.kind() == ErrorKind::WouldBlock
                || e.raw_os_error() == fs2::lock_contended_error().raw_os_error() =>
        {
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

fn map_io_err(path: &Path, err: &std::io::Error) -> CoreError {
    CoreError::Persistence(format!("Failed to lock {}: {err}", path.display()))
}
