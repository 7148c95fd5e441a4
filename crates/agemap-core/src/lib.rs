//! Core types for agemap.
//!
//! This crate provides the fundamental data structures shared by the
//! scanner, the chart calculator and the search engine: the directory tree
//! model, its ascending-time subtree iterator, the seven-number age chart
//! and the scan configuration.

mod chart;
mod config;
mod error;
mod iter;
mod tree;

pub use chart::{AgeChart, LOW};
pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::ScanError;
pub use iter::SubtreeIter;
pub use tree::{DirTree, FileEntry, NodeId};
