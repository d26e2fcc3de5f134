//! Post-success payload removal for the batch-delete workflow.
//!
//! Removal runs only after the daemon confirmed the erase. Failures are logged and never
//! reach the caller whose request already succeeded.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Deletes torrent payloads from local storage.
#[async_trait]
pub trait DataRemover: Send + Sync {
    /// Remove `path`, whether it is a file or a directory tree.
    async fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Removes payloads with `tokio::fs`; missing paths count as removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDataRemover;

#[async_trait]
impl DataRemover for FsDataRemover {
    async fn remove(&self, path: &Path) -> io::Result<()> {
        let metadata = match tokio::fs::symlink_metadata(path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "payload already absent");
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        if metadata.is_dir() {
            tokio::fs::remove_dir_all(path).await
        } else {
            tokio::fs::remove_file(path).await
        }
    }
}

/// Whether `path` may be handed to a [`DataRemover`].
///
/// The path is resolved lexically first: repeated separators collapse, `.` segments drop
/// and `..` pops its parent. Anything that resolves to empty, the root, the current
/// directory, or above the current directory is never deleted.
#[must_use]
pub fn is_removable(path: &str) -> bool {
    let path = path.trim();
    let absolute = path.starts_with('/');
    let mut depth = 0_usize;
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." if depth > 0 => depth -= 1,
            ".." if absolute => {}
            ".." => return false,
            _ => depth += 1,
        }
    }
    depth > 0
}

/// Remove every path in the background, logging failures.
pub fn spawn_removal(remover: Arc<dyn DataRemover>, paths: Vec<PathBuf>) -> JoinHandle<()> {
    tokio::spawn(async move {
        for path in paths {
            match remover.remove(&path).await {
                Ok(()) => info!(path = %path.display(), "removed torrent payload"),
                Err(err) => warn!(
                    error = %err,
                    path = %path.display(),
                    "failed to remove torrent payload"
                ),
            }
        }
    })
}
