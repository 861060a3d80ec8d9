//! Filesystem provider contract implemented for host editors
//!
//! Mirrors the capability set a host expects from a virtual filesystem:
//! stat, read, write, delete, plus watch/copy/rename/directory operations.
//! Change notifications are pushed to subscribers as batches.

use std::fmt;
use std::time::SystemTime;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;
use url::Url;

use crate::events::ChangeBatch;

/// Type of a filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
}

/// Metadata returned by stat operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub file_type: FileType,
    /// Creation time
    pub ctime: SystemTime,
    /// Last modification time
    pub mtime: SystemTime,
    pub size: u64,
}

impl FileStat {
    /// Create a regular file stat
    pub const fn file(ctime: SystemTime, mtime: SystemTime, size: u64) -> Self {
        Self {
            file_type: FileType::File,
            ctime,
            mtime,
            size,
        }
    }

    /// Stat of an empty regular file touched right now
    pub fn empty_now() -> Self {
        let now = SystemTime::now();
        Self::file(now, now, 0)
    }
}

/// Handle returned by subscriptions; `dispose` releases it
///
/// Dropping a handle without disposing it keeps the subscription alive.
pub struct Disposable {
    on_dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl Disposable {
    pub fn new(on_dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            on_dispose: Some(Box::new(on_dispose)),
        }
    }

    /// A handle whose disposal does nothing
    pub const fn noop() -> Self {
        Self { on_dispose: None }
    }

    pub fn dispose(mut self) {
        if let Some(f) = self.on_dispose.take() {
            f();
        }
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("noop", &self.on_dispose.is_none())
            .finish()
    }
}

/// Virtual filesystem provider - every host file operation goes through this
///
/// Reads and stats are synchronous; writes and deletes may suspend on store
/// I/O.
#[async_trait]
pub trait FileSystemProvider: Send + Sync {
    /// Subscribe to batched change notifications (drop the receiver to unsubscribe)
    fn subscribe(&self) -> broadcast::Receiver<ChangeBatch>;

    /// Watch an address for changes
    fn watch(&self, uri: &Url) -> Disposable;

    /// Get file metadata
    fn stat(&self, uri: &Url) -> Result<FileStat>;

    /// List directory entries
    fn read_directory(&self, uri: &Url) -> Result<Vec<(String, FileType)>>;

    /// Create a directory
    fn create_directory(&self, uri: &Url) -> Result<()>;

    /// Read entire file contents
    fn read_file(&self, uri: &Url) -> Result<Vec<u8>>;

    /// Write entire file contents (create or overwrite)
    async fn write_file(&self, uri: &Url, content: &[u8]) -> Result<()>;

    /// Delete a file
    async fn delete(&self, uri: &Url) -> Result<()>;

    /// Rename a file
    fn rename(&self, old_uri: &Url, new_uri: &Url) -> Result<()>;

    /// Copy a file
    fn copy(&self, source: &Url, destination: &Url) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_dispose_runs_callback_once() {
        let disposed = Arc::new(AtomicBool::new(false));
        let flag = disposed.clone();
        let handle = Disposable::new(move || flag.store(true, Ordering::SeqCst));

        assert!(!disposed.load(Ordering::SeqCst));
        handle.dispose();
        assert!(disposed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_empty_now_stat() {
        let stat = FileStat::empty_now();
        assert_eq!(stat.file_type, FileType::File);
        assert_eq!(stat.size, 0);
        assert_eq!(stat.ctime, stat.mtime);
    }
}
