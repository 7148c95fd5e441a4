//! Recursive report generation.
//!
//! Builds an in-memory tree document pairing every directory with both of
//! its age charts. Chart tasks for a node are issued before recursing into
//! its children so child documents assemble while the parent's reductions
//! run. Writing the document anywhere is the caller's business.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use agemap_core::{DirTree, NodeId};

use crate::calculator::{ChartCalculator, ChartError};

/// Ways a report can fail. Any chart failure or a cancellation aborts the
/// whole report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("report generation cancelled")]
    Cancelled,

    #[error("chart calculation failed: {0}")]
    Chart(ChartError),
}

impl From<ChartError> for ReportError {
    fn from(err: ChartError) -> Self {
        match err {
            ChartError::Cancelled => ReportError::Cancelled,
            other => ReportError::Chart(other),
        }
    }
}

/// One directory in the report document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportNode {
    pub name: String,
    pub num_files: usize,
    pub subtree_size: u64,
    pub files_size: u64,
    /// `[min, p5, p25, p50, p75, p95, max]` over the whole subtree.
    pub subtree_chart: [i64; 7],
    /// Same seven numbers over the direct files only.
    pub files_chart: [i64; 7],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subdirs: Vec<ReportNode>,
}

/// Generate the full recursive report for a tree.
pub async fn generate_report(
    calculator: &ChartCalculator,
    tree: &Arc<DirTree>,
    cancel: &CancellationToken,
) -> Result<ReportNode, ReportError> {
    build_node(calculator, tree, tree.root(), cancel).await
}

fn build_node<'a>(
    calculator: &'a ChartCalculator,
    tree: &'a Arc<DirTree>,
    node: NodeId,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, Result<ReportNode, ReportError>> {
    async move {
        if cancel.is_cancelled() {
            return Err(ReportError::Cancelled);
        }

        // Issue both charts before descending so the subtree reduction of
        // this node overlaps with the children's work.
        let subtree_task = calculator.calculate_subtree(Arc::clone(tree), node);
        let files_task = calculator.calculate_files(Arc::clone(tree), node);

        let mut subdirs = Vec::with_capacity(tree.num_children(node));
        for &child in tree.children(node) {
            subdirs.push(build_node(calculator, tree, child, cancel).await?);
        }

        let subtree_chart = subtree_task.join().await?;
        let files_chart = files_task.join().await?;

        Ok(ReportNode {
            name: tree.name(node).to_string(),
            num_files: tree.num_files(node),
            subtree_size: tree.subtree_size(node),
            files_size: tree.files_size(node),
            subtree_chart: subtree_chart.as_array(),
            files_chart: files_chart.as_array(),
            subdirs,
        })
    }
    .boxed()
}
