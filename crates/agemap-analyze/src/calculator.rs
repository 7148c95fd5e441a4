//! Asynchronous weighted-percentile chart calculation.
//!
//! Each calculation is posted to the blocking pool and is individually
//! cancellable through its [`ChartTask`]; the service keeps a registry of
//! in-flight tasks so [`ChartCalculator::cancel_all`] can cancel every one
//! and wait until each worker has observed the flag and returned.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use agemap_core::{AgeChart, DirTree, FileEntry, NodeId, LOW};

/// Ways a chart calculation can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChartError {
    /// The task observed its cancellation flag mid-iteration.
    #[error("chart calculation cancelled")]
    Cancelled,

    /// The worker died before producing a result.
    #[error("chart worker failed")]
    Worker,
}

/// Handle to one pending calculation.
pub struct ChartTask {
    cancel: CancellationToken,
    task: JoinHandle<Result<AgeChart, ChartError>>,
}

impl ChartTask {
    /// Request the calculation to stop at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the result.
    pub async fn join(self) -> Result<AgeChart, ChartError> {
        match self.task.await {
            Ok(result) => result,
            Err(_) => Err(ChartError::Worker),
        }
    }
}

struct TaskEntry {
    cancel: CancellationToken,
    done: watch::Receiver<bool>,
}

enum Scope {
    Subtree,
    Files,
}

/// Chart calculation service backed by the shared worker pool.
#[derive(Default)]
pub struct ChartCalculator {
    tasks: Arc<Mutex<HashMap<u64, TaskEntry>>>,
    next_id: AtomicU64,
}

impl ChartCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chart over every file reachable from `node`, weighted by
    /// `subtree_size(node)`.
    pub fn calculate_subtree(&self, tree: Arc<DirTree>, node: NodeId) -> ChartTask {
        self.spawn(tree, node, Scope::Subtree)
    }

    /// Chart over the node's direct files only, weighted by
    /// `files_size(node)`.
    pub fn calculate_files(&self, tree: Arc<DirTree>, node: NodeId) -> ChartTask {
        self.spawn(tree, node, Scope::Files)
    }

    /// Number of calculations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.tasks.lock().len()
    }

    fn spawn(&self, tree: Arc<DirTree>, node: NodeId, scope: Scope) -> ChartTask {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = watch::channel(false);
        self.tasks.lock().insert(
            id,
            TaskEntry {
                cancel: cancel.clone(),
                done: done_rx,
            },
        );

        let registry = Arc::clone(&self.tasks);
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || match scope {
                Scope::Subtree => {
                    weighted_chart(tree.subtree_iter(node), tree.subtree_size(node), &token)
                }
                Scope::Files => weighted_chart(
                    tree.files(node).iter().copied(),
                    tree.files_size(node),
                    &token,
                ),
            })
            .await;
            registry.lock().remove(&id);
            let _ = done_tx.send(true);
            match result {
                Ok(outcome) => outcome,
                Err(_) => Err(ChartError::Worker),
            }
        });

        ChartTask { cancel, task }
    }

    /// Cancel every in-flight calculation and wait for each worker to
    /// finish.
    pub async fn cancel_all(&self) {
        let entries: Vec<TaskEntry> = {
            let mut tasks = self.tasks.lock();
            tasks.drain().map(|(_, entry)| entry).collect()
        };
        if !entries.is_empty() {
            debug!("cancelling {} chart calculations", entries.len());
        }
        for entry in entries {
            entry.cancel.cancel();
            let mut done = entry.done;
            let _ = done.wait_for(|finished| *finished).await;
        }
    }
}

/// Single-pass weighted percentile reduction over a time-sorted sequence.
///
/// Thresholds use truncating integer division; each percentile field is
/// assigned at the first entry whose accumulated weight meets its
/// threshold and never overwritten, so on small inputs several fields land
/// on the same entry. A total weight of zero yields the unset chart.
fn weighted_chart<I>(
    entries: I,
    total_weight: u64,
    cancel: &CancellationToken,
) -> Result<AgeChart, ChartError>
where
    I: Iterator<Item = FileEntry>,
{
    let mut chart = AgeChart::default();
    if total_weight == 0 {
        return Ok(chart);
    }

    let lower_whisker_weight = total_weight / 20;
    let lower_quartile_weight = total_weight / 4;
    let median_weight = total_weight / 2;
    let upper_quartile_weight = total_weight - total_weight / 4;
    let upper_whisker_weight = total_weight - total_weight / 20;

    let mut accumulated: u64 = 0;
    for entry in entries {
        if cancel.is_cancelled() {
            return Err(ChartError::Cancelled);
        }
        if chart.min == LOW {
            chart.min = entry.time;
        }
        accumulated += entry.size;
        if chart.lower_whisker == LOW && accumulated >= lower_whisker_weight {
            chart.lower_whisker = entry.time;
        }
        if chart.lower_quartile == LOW && accumulated >= lower_quartile_weight {
            chart.lower_quartile = entry.time;
        }
        if chart.median == LOW && accumulated >= median_weight {
            chart.median = entry.time;
        }
        if chart.upper_quartile == LOW && accumulated >= upper_quartile_weight {
            chart.upper_quartile = entry.time;
        }
        if chart.upper_whisker == LOW && accumulated >= upper_whisker_weight {
            chart.upper_whisker = entry.time;
        }
        chart.max = entry.time;
    }
    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(clusters: &[(u64, i64)]) -> Vec<FileEntry> {
        clusters
            .iter()
            .map(|&(size, time)| FileEntry { size, time })
            .collect()
    }

    #[test]
    fn test_percentile_truncation() {
        // Four unit weights: thresholds 0, 1, 2, 3 and 4 truncate so the
        // early percentiles pile onto the first entries.
        let input = entries(&[(1, 10), (1, 20), (1, 30), (1, 40)]);
        let token = CancellationToken::new();
        let chart = weighted_chart(input.into_iter(), 4, &token).unwrap();

        assert_eq!(chart.min, 10);
        assert_eq!(chart.lower_whisker, 10);
        assert_eq!(chart.lower_quartile, 10);
        assert_eq!(chart.median, 20);
        assert_eq!(chart.upper_quartile, 30);
        assert_eq!(chart.upper_whisker, 40);
        assert_eq!(chart.max, 40);
        assert!(chart.valid());
    }

    #[test]
    fn test_single_cluster_is_singleton() {
        let input = entries(&[(100, 555)]);
        let token = CancellationToken::new();
        let chart = weighted_chart(input.into_iter(), 100, &token).unwrap();

        assert_eq!(chart.as_array(), [555; 7]);
        assert!(chart.singleton());
    }

    #[test]
    fn test_zero_weight_is_unset() {
        let token = CancellationToken::new();
        let chart = weighted_chart(std::iter::empty(), 0, &token).unwrap();
        assert!(!chart.valid());
    }

    #[test]
    fn test_cancelled_mid_iteration() {
        let input = entries(&[(1, 1), (1, 2)]);
        let token = CancellationToken::new();
        token.cancel();
        let result = weighted_chart(input.into_iter(), 2, &token);
        assert_eq!(result, Err(ChartError::Cancelled));
    }

    #[test]
    fn test_skewed_weights_pull_median() {
        // One huge old cluster dominates every percentile.
        let input = entries(&[(1000, 10), (1, 20), (1, 30)]);
        let token = CancellationToken::new();
        let chart = weighted_chart(input.into_iter(), 1002, &token).unwrap();

        assert_eq!(chart.median, 10);
        assert_eq!(chart.upper_quartile, 10);
        assert_eq!(chart.upper_whisker, 10);
        assert_eq!(chart.max, 30);
    }
}
