//! Cancellable iterative filesystem scanner.
//!
//! The walk runs on the blocking pool, maintains an explicit stack of
//! pending directories and builds the whole [`DirTree`] before delivering
//! it: a cancelled or failed scan yields no tree at all.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use agemap_core::{DirTree, NodeId, ScanConfig, ScanError};

use crate::path_chain::PathSeg;
use crate::progress::{Progress, ProgressCell};

/// Handle to one in-flight scan.
pub struct ScanHandle {
    cancel: CancellationToken,
    progress: Arc<ProgressCell>,
    task: JoinHandle<Result<DirTree, ScanError>>,
}

impl ScanHandle {
    /// Snapshot of the live counters.
    pub fn progress(&self) -> Progress {
        self.progress.snapshot()
    }

    /// Shared counter cell, for polling while [`ScanHandle::join`] is pending.
    pub fn progress_cell(&self) -> Arc<ProgressCell> {
        Arc::clone(&self.progress)
    }

    /// Request the worker to stop at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the scan to finish and take the completed tree.
    pub async fn join(self) -> Result<DirTree, ScanError> {
        match self.task.await {
            Ok(result) => result,
            Err(err) => Err(ScanError::worker(err.to_string())),
        }
    }
}

struct ActiveScan {
    cancel: CancellationToken,
    done: watch::Receiver<bool>,
}

/// Scanner service. Holds at most one scan at a time; starting a new scan
/// cancels the previous one and waits for its worker to return.
#[derive(Default)]
pub struct Scanner {
    current: Option<ActiveScan>,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a scan is currently running.
    pub fn is_scanning(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|scan| !*scan.done.borrow())
    }

    /// Start scanning `config.root`. Any previous scan is cancelled first.
    pub async fn start(&mut self, config: &ScanConfig) -> ScanHandle {
        self.cancel().await;

        let cancel = CancellationToken::new();
        let progress = Arc::new(ProgressCell::new());
        let (done_tx, done_rx) = watch::channel(false);

        let root = config.root.clone();
        let token = cancel.clone();
        let cell = Arc::clone(&progress);
        debug!("starting scan of {}", root.display());
        let task = tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || walk(root, &token, &cell)).await;
            let _ = done_tx.send(true);
            match result {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!("scan worker failed: {err}");
                    Err(ScanError::worker(err.to_string()))
                }
            }
        });

        self.current = Some(ActiveScan {
            cancel: cancel.clone(),
            done: done_rx,
        });
        ScanHandle {
            cancel,
            progress,
            task,
        }
    }

    /// Cancel any in-flight scan and wait for the worker to quiesce.
    pub async fn cancel(&mut self) {
        if let Some(active) = self.current.take() {
            active.cancel.cancel();
            let mut done = active.done;
            let _ = done.wait_for(|finished| *finished).await;
        }
    }
}

/// Iterative walk over an explicit stack of pending directories.
///
/// For every directory: open it, lstat each entry against a reused path
/// buffer, append regular files (counted) and subdirectories (pushed), skip
/// everything else, then finalize the node so its files are time-sorted.
/// Open and stat failures are counted, never raised.
fn walk(
    root: PathBuf,
    cancel: &CancellationToken,
    progress: &ProgressCell,
) -> Result<DirTree, ScanError> {
    let mut tree = DirTree::new(root.to_string_lossy());
    let mut stack: Vec<(NodeId, Arc<PathSeg>)> = Vec::new();
    stack.push((tree.root(), PathSeg::root(root.into_os_string())));

    let mut buf = PathBuf::new();

    while let Some((node, seg)) = stack.pop() {
        if cancel.is_cancelled() {
            debug!("scan cancelled");
            return Err(ScanError::Cancelled);
        }

        seg.write_to(&mut buf);
        let entries = match fs::read_dir(&buf) {
            Ok(entries) => entries,
            Err(err) => {
                debug!("cannot open {}: {err}", buf.display());
                progress.incr_errors();
                continue;
            }
        };

        for entry in entries {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => {
                    progress.incr_errors();
                    continue;
                }
            };

            let name = entry.file_name();
            buf.push(&name);
            let metadata = match fs::symlink_metadata(&buf) {
                Ok(metadata) => metadata,
                Err(_) => {
                    progress.incr_errors();
                    buf.pop();
                    continue;
                }
            };

            let file_type = metadata.file_type();
            if file_type.is_dir() {
                progress.incr_dirs();
                let child = tree.alloc(name.to_string_lossy());
                tree.append_child(node, child);
                stack.push((child, PathSeg::child(&seg, name)));
            } else if file_type.is_file() {
                progress.incr_files();
                tree.append_file(node, metadata.len(), mtime_secs(&metadata));
            } else {
                // Symlinks and all other entry types are skipped, not followed.
                progress.incr_skipped();
            }
            buf.pop();
        }

        tree.finalize(node);
    }

    debug!(
        "scan complete: {} files, {} dirs",
        progress.snapshot().num_files,
        progress.snapshot().num_dirs
    );
    Ok(tree)
}

/// Modification time in seconds since the epoch, from lstat.
#[cfg(unix)]
fn mtime_secs(metadata: &fs::Metadata) -> i64 {
    use std::os::unix::fs::MetadataExt;
    metadata.mtime()
}

#[cfg(not(unix))]
fn mtime_secs(metadata: &fs::Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
