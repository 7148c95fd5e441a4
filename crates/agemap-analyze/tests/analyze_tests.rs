use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use agemap_analyze::{generate_report, ChartCalculator, ChartError, ReportError};
use agemap_core::{DirTree, NodeId, LOW};

fn flat_tree(times: &[(u64, i64)]) -> Arc<DirTree> {
    let mut tree = DirTree::new("root");
    let root = tree.root();
    for &(size, time) in times {
        tree.append_file(root, size, time);
    }
    tree.finalize(root);
    Arc::new(tree)
}

/// root -> sub (three files), root itself has one file.
fn nested_tree() -> (Arc<DirTree>, NodeId) {
    let mut tree = DirTree::new("root");
    let root = tree.root();
    let sub = tree.alloc("sub");
    tree.append_child(root, sub);
    tree.append_file(sub, 1, 100);
    tree.append_file(sub, 1, 200);
    tree.append_file(sub, 1, 300);
    tree.append_file(root, 1, 150);
    tree.finalize(sub);
    tree.finalize(root);
    (Arc::new(tree), sub)
}

#[tokio::test]
async fn test_subtree_chart_percentile_truncation() {
    let tree = flat_tree(&[(1, 10), (1, 20), (1, 30), (1, 40)]);
    let calculator = ChartCalculator::new();

    let chart = calculator
        .calculate_subtree(Arc::clone(&tree), tree.root())
        .join()
        .await
        .unwrap();

    assert_eq!(chart.min, 10);
    assert_eq!(chart.lower_whisker, 10);
    assert_eq!(chart.lower_quartile, 10);
    assert_eq!(chart.median, 20);
    assert_eq!(chart.upper_quartile, 30);
    assert_eq!(chart.upper_whisker, 40);
    assert_eq!(chart.max, 40);
}

#[tokio::test]
async fn test_singleton_chart() {
    let tree = flat_tree(&[(100, 555)]);
    let calculator = ChartCalculator::new();

    let chart = calculator
        .calculate_subtree(Arc::clone(&tree), tree.root())
        .join()
        .await
        .unwrap();

    assert_eq!(chart.as_array(), [555; 7]);
    assert!(chart.singleton());
}

#[tokio::test]
async fn test_empty_subtree_is_unset() {
    let mut tree = DirTree::new("root");
    let root = tree.root();
    let empty = tree.alloc("empty");
    tree.append_child(root, empty);
    tree.finalize(empty);
    tree.finalize(root);
    let tree = Arc::new(tree);

    let calculator = ChartCalculator::new();
    let chart = calculator
        .calculate_subtree(Arc::clone(&tree), root)
        .join()
        .await
        .unwrap();

    assert!(!chart.valid());
    assert_eq!(chart.min, LOW);
}

#[tokio::test]
async fn test_files_chart_ignores_subdirectories() {
    let (tree, _) = nested_tree();
    let calculator = ChartCalculator::new();

    let chart = calculator
        .calculate_files(Arc::clone(&tree), tree.root())
        .join()
        .await
        .unwrap();

    // Only the single direct file at t=150 participates.
    assert_eq!(chart.as_array(), [150; 7]);
    assert!(chart.singleton());
}

#[tokio::test]
async fn test_subtree_chart_spans_descendants() {
    let (tree, _) = nested_tree();
    let calculator = ChartCalculator::new();

    let chart = calculator
        .calculate_subtree(Arc::clone(&tree), tree.root())
        .join()
        .await
        .unwrap();

    assert_eq!(chart.min, 100);
    assert_eq!(chart.max, 300);
    assert!(chart.valid());
}

#[tokio::test]
async fn test_pre_cancelled_task_yields_cancelled() {
    let tree = flat_tree(&[(1, 1), (1, 2), (1, 3)]);
    let calculator = ChartCalculator::new();

    let task = calculator.calculate_subtree(Arc::clone(&tree), tree.root());
    task.cancel();
    // Cancellation may race completion on a tiny input; both outcomes are
    // legal, but a cancelled task must not produce a chart.
    match task.join().await {
        Err(ChartError::Cancelled) => {}
        Ok(chart) => assert!(chart.valid()),
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_cancel_all_quiesces_registry() {
    let tree = flat_tree(&[(1, 1), (1, 2), (1, 3)]);
    let calculator = ChartCalculator::new();

    let tasks: Vec<_> = (0..8)
        .map(|_| calculator.calculate_subtree(Arc::clone(&tree), tree.root()))
        .collect();

    calculator.cancel_all().await;
    assert_eq!(calculator.in_flight(), 0);

    for task in tasks {
        // Each task has finished one way or the other by now.
        let _ = task.join().await;
    }
}

#[tokio::test]
async fn test_report_document_shape() {
    let (tree, _) = nested_tree();
    let calculator = ChartCalculator::new();
    let token = CancellationToken::new();

    let report = generate_report(&calculator, &tree, &token).await.unwrap();

    assert_eq!(report.name, "root");
    assert_eq!(report.num_files, 1);
    assert_eq!(report.subtree_size, 4);
    assert_eq!(report.files_size, 1);
    assert_eq!(report.subdirs.len(), 1);

    let sub = &report.subdirs[0];
    assert_eq!(sub.name, "sub");
    assert_eq!(sub.num_files, 3);
    assert_eq!(sub.subtree_size, 3);
    assert!(sub.subdirs.is_empty());

    assert_eq!(report.subtree_chart[0], 100);
    assert_eq!(report.subtree_chart[6], 300);
}

#[tokio::test]
async fn test_report_serialises_camel_case_and_omits_empty_subdirs() {
    let (tree, _) = nested_tree();
    let calculator = ChartCalculator::new();
    let token = CancellationToken::new();

    let report = generate_report(&calculator, &tree, &token).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert!(json.get("numFiles").is_some());
    assert!(json.get("subtreeSize").is_some());
    assert!(json.get("filesSize").is_some());
    assert_eq!(
        json.get("subtreeChart").unwrap().as_array().unwrap().len(),
        7
    );

    // The leaf has no subdirectories, so the key disappears entirely.
    let sub = &json.get("subdirs").unwrap().as_array().unwrap()[0];
    assert!(sub.get("subdirs").is_none());
}

#[tokio::test]
async fn test_cancelled_report_fails_whole_future() {
    let (tree, _) = nested_tree();
    let calculator = ChartCalculator::new();
    let token = CancellationToken::new();
    token.cancel();

    let result = generate_report(&calculator, &tree, &token).await;
    assert!(matches!(result, Err(ReportError::Cancelled)));
}
