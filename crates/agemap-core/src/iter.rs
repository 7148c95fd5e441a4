//! Ascending-time merge iterator over a subtree.
//!
//! Each iterator owns one child iterator per subdirectory, kept in a
//! contiguous min-heap keyed by the child's current front time, while the
//! node's direct files advance through a plain cursor. Heap storage is
//! proportional to the number of directories in the subtree; the merge is a
//! single lazy pass.

use crate::tree::{DirTree, FileEntry, NodeId};

/// Lazy iterator yielding every [`FileEntry`] reachable from one node in
/// non-decreasing `time` order. Obtained from [`DirTree::subtree_iter`].
pub struct SubtreeIter<'t> {
    files: &'t [FileEntry],
    pos: usize,
    /// Min-heap of non-exhausted child iterators, keyed by `current.time`.
    subs: Vec<SubtreeIter<'t>>,
    current: Option<FileEntry>,
}

impl<'t> SubtreeIter<'t> {
    pub(crate) fn new(tree: &'t DirTree, id: NodeId) -> Self {
        let mut subs: Vec<SubtreeIter<'t>> = Vec::with_capacity(tree.num_children(id));
        for &child in tree.children(id) {
            let sub = SubtreeIter::new(tree, child);
            if sub.current.is_some() {
                let at = subs.len();
                subs.push(sub);
                sift_up(&mut subs, at);
            }
        }
        let mut iter = Self {
            files: tree.files(id),
            pos: 0,
            subs,
            current: None,
        };
        iter.advance();
        iter
    }

    /// Move `current` to the next entry in merge order. A tie between the
    /// direct-file cursor and the heap top goes to the direct file.
    fn advance(&mut self) {
        let direct = self.files.get(self.pos).copied();
        let merged = self.subs.first().and_then(|sub| sub.current);
        match (direct, merged) {
            (Some(file), Some(sub)) if file.time <= sub.time => {
                self.current = Some(file);
                self.pos += 1;
            }
            (Some(file), None) => {
                self.current = Some(file);
                self.pos += 1;
            }
            (None, None) => {
                self.current = None;
            }
            (_, Some(sub)) => {
                self.current = Some(sub);
                self.subs[0].advance();
                if self.subs[0].current.is_none() {
                    self.subs.swap_remove(0);
                }
                if !self.subs.is_empty() {
                    sift_down(&mut self.subs, 0);
                }
            }
        }
    }
}

impl Iterator for SubtreeIter<'_> {
    type Item = FileEntry;

    fn next(&mut self) -> Option<FileEntry> {
        let entry = self.current?;
        self.advance();
        Some(entry)
    }
}

fn key(iter: &SubtreeIter<'_>) -> i64 {
    iter.current.map_or(i64::MAX, |entry| entry.time)
}

fn sift_up(heap: &mut [SubtreeIter<'_>], mut i: usize) {
    while i > 0 {
        let parent = (i - 1) / 2;
        if key(&heap[i]) < key(&heap[parent]) {
            heap.swap(i, parent);
            i = parent;
        } else {
            break;
        }
    }
}

fn sift_down(heap: &mut [SubtreeIter<'_>], mut i: usize) {
    loop {
        let left = 2 * i + 1;
        let right = left + 1;
        let mut smallest = i;
        if left < heap.len() && key(&heap[left]) < key(&heap[smallest]) {
            smallest = left;
        }
        if right < heap.len() && key(&heap[right]) < key(&heap[smallest]) {
            smallest = right;
        }
        if smallest == i {
            break;
        }
        heap.swap(i, smallest);
        i = smallest;
    }
}
