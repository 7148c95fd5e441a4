//! Presentation-layer glue for agemap.
//!
//! [`TreeModel`] answers view queries over a scanned tree: display text per
//! column, numeric roles, the virtual files row, and a cache of completed
//! age charts with the min/max extent the chart rendering scales to.

mod adapter;

pub use adapter::{format_size, fuzzy_age, Column, Role, RowRef, TreeModel};

// Re-export core types for convenience
pub use agemap_core::{AgeChart, DirTree, NodeId};
