use agemap_core::{AgeChart, DirTree, FileEntry, NodeId, LOW};

/// Build a small fixed tree:
///
/// root
///   a        files at t=1,5,9 (1 byte each)
///     a1     files at t=4,8
///   b        files at t=2,6,10
/// plus a direct root file at t=3.
fn sample_tree() -> (DirTree, NodeId, NodeId, NodeId) {
    let mut tree = DirTree::new("root");
    let root = tree.root();
    let a = tree.alloc("a");
    tree.append_child(root, a);
    let a1 = tree.alloc("a1");
    tree.append_child(a, a1);
    let b = tree.alloc("b");
    tree.append_child(root, b);

    for t in [1, 5, 9] {
        tree.append_file(a, 1, t);
    }
    for t in [4, 8] {
        tree.append_file(a1, 1, t);
    }
    for t in [2, 6, 10] {
        tree.append_file(b, 1, t);
    }
    tree.append_file(root, 1, 3);

    for id in [a1, a, b, root] {
        tree.finalize(id);
    }
    (tree, a, a1, b)
}

#[test]
fn test_subtree_size_consistency() {
    let (tree, ..) = sample_tree();
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        let children_total: u64 = tree
            .children(id)
            .iter()
            .map(|&c| tree.subtree_size(c))
            .sum();
        assert_eq!(tree.subtree_size(id), tree.files_size(id) + children_total);
        stack.extend_from_slice(tree.children(id));
    }
    assert_eq!(tree.subtree_size(tree.root()), 9);
}

#[test]
fn test_files_sorted_after_finalize() {
    let (tree, ..) = sample_tree();
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        let times: Vec<i64> = tree.files(id).iter().map(|f| f.time).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        stack.extend_from_slice(tree.children(id));
    }
}

#[test]
fn test_subtree_iterator_full_merge() {
    let (tree, ..) = sample_tree();
    let times: Vec<i64> = tree.subtree_iter(tree.root()).map(|f| f.time).collect();
    assert_eq!(times, vec![1, 2, 3, 4, 5, 6, 8, 9, 10]);
}

#[test]
fn test_subtree_iterator_visit_count_matches_cluster_count() {
    let (tree, ..) = sample_tree();
    let mut clusters = 0;
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        clusters += tree.num_files(id);
        stack.extend_from_slice(tree.children(id));
    }
    assert_eq!(tree.subtree_iter(tree.root()).count(), clusters);
}

#[test]
fn test_subtree_iterator_partial_subtree() {
    let (tree, a, ..) = sample_tree();
    let times: Vec<i64> = tree.subtree_iter(a).map(|f| f.time).collect();
    assert_eq!(times, vec![1, 4, 5, 8, 9]);
}

#[test]
fn test_iterator_yields_coalesced_clusters() {
    let mut tree = DirTree::new("root");
    let root = tree.root();
    tree.append_file(root, 3, 100);
    tree.append_file(root, 4, 100);
    tree.finalize(root);

    let entries: Vec<FileEntry> = tree.subtree_iter(root).collect();
    assert_eq!(entries, vec![FileEntry { size: 7, time: 100 }]);
}

#[test]
fn test_chart_sentinel_round_trip() {
    let chart = AgeChart::default();
    assert!(chart.as_array().iter().all(|&v| v == LOW));
    assert!(!chart.valid());
}
