//! Presentation adapter over a scanned tree.
//!
//! Maps tree rows to display values and roles for a five-column view,
//! caching completed age charts per row and tracking the observed time
//! extent for chart rendering. Widget code and painting stay elsewhere;
//! this stops at the value boundary.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use agemap_core::{AgeChart, DirTree, NodeId, LOW};

/// One visible row: a directory, or the virtual `[Files]` row summarising a
/// directory's direct files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowRef {
    Dir(NodeId),
    Files(NodeId),
}

/// View columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Name,
    Kind,
    Size,
    MedianAge,
    AgeChart,
}

/// Data roles beyond plain display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Size of the whole tree, the scale for every row.
    TotalSize,
    /// Smallest lower whisker seen across cached charts.
    MinAge,
    /// Largest upper whisker seen across cached charts.
    MaxAge,
    /// Size of this row's entry (subtree or direct files).
    EntrySize,
    /// Sort key: the cached median, or `i64::MAX` while uncalculated so
    /// unknown rows sort last.
    SortKey,
}

/// Chart cache and display glue for the current tree.
pub struct TreeModel {
    tree: Option<Arc<DirTree>>,
    charts: HashMap<RowRef, AgeChart>,
    charts_min: i64,
    charts_max: i64,
    reset_time: i64,
}

impl TreeModel {
    pub fn new() -> Self {
        Self {
            tree: None,
            charts: HashMap::new(),
            charts_min: i64::MAX,
            charts_max: LOW,
            reset_time: now_secs(),
        }
    }

    /// Replace the tree. Clears the chart cache and the min/max aggregates
    /// and restamps the reference time used for age rendering.
    pub fn reset(&mut self, tree: Option<Arc<DirTree>>) {
        self.tree = tree;
        self.charts.clear();
        self.charts_min = i64::MAX;
        self.charts_max = LOW;
        self.reset_time = now_secs();
    }

    pub fn tree(&self) -> Option<&Arc<DirTree>> {
        self.tree.as_ref()
    }

    pub fn is_chart_cached(&self, row: RowRef) -> bool {
        self.charts.contains_key(&row)
    }

    pub fn chart(&self, row: RowRef) -> Option<&AgeChart> {
        self.charts.get(&row)
    }

    /// Store a completed chart for a row. Invalid (no-data) charts are
    /// dropped; valid ones widen the min/max extent used as the shared
    /// time axis.
    pub fn insert_chart(&mut self, row: RowRef, chart: AgeChart) {
        if !chart.valid() {
            return;
        }
        if self.charts_min > chart.lower_whisker {
            self.charts_min = chart.lower_whisker;
        }
        if self.charts_max < chart.upper_whisker {
            self.charts_max = chart.upper_whisker;
        }
        self.charts.insert(row, chart);
    }

    /// Rows shown beneath a directory: its subdirectories, plus the virtual
    /// files row when it has direct files.
    pub fn row_count(&self, node: NodeId) -> usize {
        match &self.tree {
            Some(tree) => {
                tree.num_children(node) + usize::from(tree.num_files(node) > 0)
            }
            None => 0,
        }
    }

    /// The row at `index` beneath `node`: subdirectories first, the files
    /// row last.
    pub fn row_at(&self, node: NodeId, index: usize) -> Option<RowRef> {
        let tree = self.tree.as_ref()?;
        let children = tree.num_children(node);
        if index < children {
            Some(RowRef::Dir(tree.child(node, index)))
        } else if index == children && tree.num_files(node) > 0 {
            Some(RowRef::Files(node))
        } else {
            None
        }
    }

    /// Display text for a row and column.
    pub fn display(&self, row: RowRef, column: Column) -> String {
        let Some(tree) = self.tree.as_ref() else {
            return String::new();
        };
        match (row, column) {
            (RowRef::Dir(node), Column::Name) => tree.name(node).to_string(),
            (RowRef::Files(_), Column::Name) => "[Files]".to_string(),
            (RowRef::Dir(_), Column::Kind) => "Directory".to_string(),
            (RowRef::Files(_), Column::Kind) => "Files".to_string(),
            (RowRef::Dir(node), Column::Size) => format_size(tree.subtree_size(node)),
            (RowRef::Files(node), Column::Size) => format_size(tree.files_size(node)),
            (_, Column::MedianAge) => self
                .charts
                .get(&row)
                .map(|chart| fuzzy_age(chart.median, self.reset_time))
                .unwrap_or_default(),
            // The chart column carries no text; the drawing consumes the
            // cached chart and the min/max roles directly.
            (_, Column::AgeChart) => String::new(),
        }
    }

    /// Numeric role value for a row.
    pub fn role_value(&self, row: RowRef, role: Role) -> i64 {
        let Some(tree) = self.tree.as_ref() else {
            return 0;
        };
        match role {
            Role::TotalSize => tree.subtree_size(tree.root()) as i64,
            Role::MinAge => self.charts_min,
            Role::MaxAge => self.charts_max,
            Role::EntrySize => match row {
                RowRef::Dir(node) => tree.subtree_size(node) as i64,
                RowRef::Files(node) => tree.files_size(node) as i64,
            },
            Role::SortKey => self
                .charts
                .get(&row)
                .map(|chart| chart.median)
                .unwrap_or(i64::MAX),
        }
    }
}

impl Default for TreeModel {
    fn default() -> Self {
        Self::new()
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Binary-prefixed size text.
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Coarse age text for a timestamp relative to `now`: `2yr 3mo`, `5mo`,
/// `2wk`, `3d`, `4h 12m`, `59m` or `30sec`.
pub fn fuzzy_age(timestamp: i64, now: i64) -> String {
    let seconds = (now - timestamp).max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    let months = days / 30;
    let years = days / 365;

    if years > 0 {
        format!("{}yr {}mo", years, (days - years * 365) / 30)
    } else if months > 0 {
        format!("{months}mo")
    } else if days > 6 {
        format!("{}wk", days / 7)
    } else if days > 0 {
        format!("{days}d")
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{seconds}sec")
    }
}
