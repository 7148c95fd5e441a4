//! Filesystem scanning engine for agemap.
//!
//! This crate provides the cancellable iterative directory walker that
//! builds the shared [`DirTree`] and streams live progress counters.

mod path_chain;
mod progress;
mod scanner;

pub use progress::{Progress, ProgressCell};
pub use scanner::{ScanHandle, Scanner};

// Re-export core types for convenience
pub use agemap_core::{DirTree, FileEntry, NodeId, ScanConfig, ScanError};
