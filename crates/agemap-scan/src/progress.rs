//! Scan progress reporting.

use parking_lot::Mutex;

/// Counters accumulated during a scan. Monotonically non-decreasing while
/// the scan runs; the UI polls a snapshot on a timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Regular files appended to the tree.
    pub num_files: u64,
    /// Directories entered.
    pub num_dirs: u64,
    /// Symlinks, devices, sockets and pipes, all skipped.
    pub num_skipped: u64,
    /// Entries whose open or stat failed.
    pub num_errors: u64,
}

impl Progress {
    /// Total entries seen so far.
    pub fn total(&self) -> u64 {
        self.num_files + self.num_dirs + self.num_skipped + self.num_errors
    }
}

/// Shared cell holding the live counters. Single writer (the scan worker),
/// any number of snapshot readers; a word-sized lock keeps the four counters
/// consistent as a group.
#[derive(Debug, Default)]
pub struct ProgressCell {
    inner: Mutex<Progress>,
}

impl ProgressCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// A consistent copy of all four counters.
    pub fn snapshot(&self) -> Progress {
        *self.inner.lock()
    }

    pub(crate) fn incr_files(&self) {
        self.inner.lock().num_files += 1;
    }

    pub(crate) fn incr_dirs(&self) {
        self.inner.lock().num_dirs += 1;
    }

    pub(crate) fn incr_skipped(&self) {
        self.inner.lock().num_skipped += 1;
    }

    pub(crate) fn incr_errors(&self) {
        self.inner.lock().num_errors += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_increments() {
        let cell = ProgressCell::new();
        cell.incr_files();
        cell.incr_files();
        cell.incr_dirs();
        cell.incr_skipped();

        let snapshot = cell.snapshot();
        assert_eq!(snapshot.num_files, 2);
        assert_eq!(snapshot.num_dirs, 1);
        assert_eq!(snapshot.num_skipped, 1);
        assert_eq!(snapshot.num_errors, 0);
        assert_eq!(snapshot.total(), 4);
    }
}
