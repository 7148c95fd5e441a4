//! Work-stealing breadth-first search workers.
//!
//! Every worker owns a bounded local FIFO of pending tree nodes behind a
//! word-sized lock. Worker 0 starts with the root; the rest recruit
//! themselves by stealing from randomly chosen victims. A shared busy
//! counter tracks how many workers hold work so an idle worker can tell
//! "nothing left anywhere" from "nothing stolen this round", and an exit
//! counter lets the last worker out close the result stream exactly once.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;
use parking_lot::Mutex;

use agemap_core::{DirTree, NodeId};

use crate::pattern::Matcher;

/// Local queue capacity. Children beyond this are processed recursively
/// inline instead of enqueued, bounding queue memory on wide directories.
const LOCAL_QUEUE_CAP: usize = 32;

/// One item of the search result stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEvent {
    /// A node whose name matched the pattern.
    Match(NodeId),
    /// Emitted exactly once, after every worker has stopped producing.
    Done {
        /// Total number of matches streamed.
        hits: usize,
    },
}

pub(crate) struct Shared {
    pub(crate) queues: Vec<Mutex<VecDeque<NodeId>>>,
    pub(crate) busy: AtomicUsize,
    exit: AtomicUsize,
    hits: AtomicUsize,
    cancelled: AtomicBool,
}

impl Shared {
    pub(crate) fn new(workers: usize) -> Self {
        Self {
            queues: (0..workers)
                .map(|_| Mutex::new(VecDeque::with_capacity(LOCAL_QUEUE_CAP)))
                .collect(),
            busy: AtomicUsize::new(0),
            exit: AtomicUsize::new(workers),
            hits: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
        }
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// SplitMix64 generator for victim selection; one per worker, seeded by the
/// worker index so runs need no global RNG state.
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

pub(crate) struct Worker {
    index: usize,
    shared: Arc<Shared>,
    tree: Arc<DirTree>,
    matcher: Matcher,
    results: Sender<SearchEvent>,
    rng: SplitMix64,
    local_hits: usize,
}

impl Worker {
    pub(crate) fn new(
        index: usize,
        shared: Arc<Shared>,
        tree: Arc<DirTree>,
        matcher: Matcher,
        results: Sender<SearchEvent>,
    ) -> Self {
        Self {
            index,
            shared,
            tree,
            matcher,
            results,
            rng: SplitMix64::new(index as u64),
            local_hits: 0,
        }
    }

    pub(crate) fn run(mut self) {
        loop {
            if self.shared.cancelled.load(Ordering::Acquire) {
                self.graceful_exit();
                return;
            }

            let popped = self.shared.queues[self.index].lock().pop_front();
            if let Some(node) = popped {
                self.process(node);
                self.process_children(node);
                self.release_if_drained();
            } else {
                match self.steal() {
                    Some(node) => {
                        self.process(node);
                        self.process_children(node);
                        self.release_if_drained();
                    }
                    None => {
                        if self.shared.busy.load(Ordering::Acquire) == 0 {
                            self.graceful_exit();
                            return;
                        }
                        thread::yield_now();
                    }
                }
            }
        }
    }

    /// A worker counts as busy from the moment it gains work (seed or
    /// steal) until its queue drains after processing; the decrement stays
    /// under the queue lock so emptiness and the counter move together.
    fn release_if_drained(&self) {
        let queue = self.shared.queues[self.index].lock();
        if queue.is_empty() {
            self.shared.busy.fetch_sub(1, Ordering::AcqRel);
        }
    }

    fn process(&mut self, node: NodeId) {
        if self.matcher.matches(self.tree.name(node)) {
            self.local_hits += 1;
            let _ = self.results.send(SearchEvent::Match(node));
        }
    }

    /// Enqueue children onto the local queue while capacity remains; once
    /// the queue is full, descend into the remaining children inline.
    fn process_children(&mut self, node: NodeId) {
        for i in 0..self.tree.num_children(node) {
            let child = self.tree.child(node, i);
            let enqueued = {
                let mut queue = self.shared.queues[self.index].lock();
                if queue.len() < LOCAL_QUEUE_CAP {
                    queue.push_back(child);
                    true
                } else {
                    false
                }
            };
            if !enqueued {
                self.process(child);
                self.process_children(child);
            }
        }
    }

    /// Take one node from a random other worker. The victim's last item is
    /// never taken: stealing it would not recruit an additional worker.
    fn steal(&mut self) -> Option<NodeId> {
        let workers = self.shared.queues.len();
        if workers <= 1 {
            return None;
        }
        let mut victim = self.index;
        while victim == self.index {
            victim = (self.rng.next() % workers as u64) as usize;
        }

        let mut queue = self.shared.queues[victim].lock();
        if queue.len() > 1 {
            let node = queue.pop_front();
            self.shared.busy.fetch_add(1, Ordering::AcqRel);
            node
        } else {
            None
        }
    }

    /// The worker that brings the exit counter to zero publishes the final
    /// hit count; the stream then closes as the last sender drops.
    fn graceful_exit(self) {
        self.shared
            .hits
            .fetch_add(self.local_hits, Ordering::AcqRel);
        if self.shared.exit.fetch_sub(1, Ordering::AcqRel) == 1 {
            let hits = self.shared.hits.load(Ordering::Acquire);
            let _ = self.results.send(SearchEvent::Done { hits });
        }
    }
}
