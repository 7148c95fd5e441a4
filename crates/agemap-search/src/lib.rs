//! Parallel directory-name search for agemap.
//!
//! A fixed pool of workers enumerates the shared [`DirTree`] breadth-first
//! with work stealing and streams every node whose name matches the query.
//! One search runs at a time; starting a new one cancels the previous.

mod pattern;
mod worker;

pub use pattern::{Matcher, PatternError, SearchMode};
pub use worker::SearchEvent;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use tracing::debug;

use agemap_core::{DirTree, NodeId};

use worker::{Shared, Worker};

struct ActiveSearch {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

/// Search service owning the worker pool of the active search.
#[derive(Default)]
pub struct SearchEngine {
    /// Worker count override; 0 means one per hardware thread.
    threads: usize,
    current: Option<ActiveSearch>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed worker count instead of one per hardware thread.
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads,
            current: None,
        }
    }

    /// Start a search over `tree`. Cancels and joins any previous search
    /// first. A malformed pattern fails here; no workers are spawned and no
    /// partial results exist.
    ///
    /// Matches stream through the returned receiver in an order determined
    /// by the work-stealing race; every matching node, the root included,
    /// is emitted exactly once, then one [`SearchEvent::Done`] closes the
    /// stream.
    pub fn start(
        &mut self,
        pattern: &str,
        mode: SearchMode,
        tree: Arc<DirTree>,
    ) -> Result<Receiver<SearchEvent>, PatternError> {
        self.cancel();

        let matcher = Matcher::compile(pattern, mode)?;
        let workers = if self.threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.threads
        };
        debug!("starting {} search with {workers} workers", mode.label());

        let shared = Arc::new(Shared::new(workers));
        // Seed worker 0 before any thread runs so the busy counter starts
        // consistent with the queue contents.
        shared.queues[0].lock().push_back(tree.root());
        shared.busy.store(1, Ordering::Release);

        let (tx, rx) = crossbeam_channel::unbounded();
        let handles = (0..workers)
            .map(|index| {
                let worker = Worker::new(
                    index,
                    Arc::clone(&shared),
                    Arc::clone(&tree),
                    matcher.clone(),
                    tx.clone(),
                );
                std::thread::spawn(move || worker.run())
            })
            .collect();

        self.current = Some(ActiveSearch {
            shared,
            workers: handles,
        });
        Ok(rx)
    }

    /// Cancel the active search and wait for every worker to stop.
    pub fn cancel(&mut self) {
        if let Some(active) = self.current.take() {
            active.shared.cancel();
            for handle in active.workers {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for SearchEngine {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Convenience for callers that want the full result set: drains the stream
/// until `Done` and returns the matched nodes.
pub fn collect_matches(rx: &Receiver<SearchEvent>) -> (Vec<NodeId>, usize) {
    let mut matches = Vec::new();
    let mut total = 0;
    for event in rx.iter() {
        match event {
            SearchEvent::Match(node) => matches.push(node),
            SearchEvent::Done { hits } => {
                total = hits;
                break;
            }
        }
    }
    (matches, total)
}
