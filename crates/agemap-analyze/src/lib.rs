//! Analysis services for agemap.
//!
//! This crate runs over a completed [`DirTree`]:
//!
//! - **Chart calculation** - weighted box-plot percentiles over a subtree
//!   or over one directory's direct files, on the shared worker pool
//! - **Report generation** - the recursive document pairing every
//!   directory with both of its charts
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use agemap_analyze::ChartCalculator;
//!
//! let calculator = ChartCalculator::new();
//! let chart = calculator
//!     .calculate_subtree(Arc::clone(&tree), tree.root())
//!     .join()
//!     .await?;
//! println!("median mtime: {}", chart.median);
//! ```

mod calculator;
mod report;

pub use calculator::{ChartCalculator, ChartError, ChartTask};
pub use report::{generate_report, ReportError, ReportNode};

// Re-export core types
pub use agemap_core::{AgeChart, DirTree, FileEntry, NodeId, LOW};
