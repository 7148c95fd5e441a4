//! Directory tree model.
//!
//! A [`DirTree`] owns every node of one scanned directory hierarchy in an
//! arena; [`NodeId`] handles index into it. Parent links are plain indices,
//! so navigating upwards never extends a node's lifetime — dropping the tree
//! drops everything.

use compact_str::CompactString;

use crate::iter::SubtreeIter;

/// A cluster of one or more files sharing a modification time.
///
/// The scanner coalesces consecutive appends with an identical `time` into a
/// single entry, so `size` is the combined byte count of the cluster, not a
/// file count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileEntry {
    /// Total size of the cluster in bytes.
    pub size: u64,
    /// Modification time, seconds since the Unix epoch.
    pub time: i64,
}

/// Handle to a node within a [`DirTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of this node in the owning arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct Node {
    name: CompactString,
    files: Vec<FileEntry>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    parent_pos: usize,
    files_size: u64,
    subtree_size: u64,
}

impl Node {
    fn new(name: CompactString) -> Self {
        Self {
            name,
            files: Vec::new(),
            children: Vec::new(),
            parent: None,
            parent_pos: 0,
            files_size: 0,
            subtree_size: 0,
        }
    }
}

/// An owned directory tree with per-node file lists and cumulative sizes.
///
/// Built by the scanner, then shared read-only between the chart calculator,
/// the search engine and the report builder. `subtree_size` is maintained
/// incrementally on every append, so it is always consistent with the sum of
/// the node's own files and its children's subtrees.
#[derive(Debug)]
pub struct DirTree {
    nodes: Vec<Node>,
}

impl DirTree {
    /// Create a tree holding only the root node. The root's name is the
    /// user-supplied path of the scanned directory.
    pub fn new(root_name: impl AsRef<str>) -> Self {
        Self {
            nodes: vec![Node::new(CompactString::new(root_name))],
        }
    }

    /// The root node, present from construction.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Total number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a detached directory node. It joins the tree structure once
    /// passed to [`DirTree::append_child`].
    pub fn alloc(&mut self, name: impl AsRef<str>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(CompactString::new(name)));
        id
    }

    /// Append a file to a directory, coalescing with the previous entry when
    /// the modification time is identical. Updates `files_size` locally and
    /// `subtree_size` along the whole parent chain.
    pub fn append_file(&mut self, id: NodeId, size: u64, time: i64) {
        let node = &mut self.nodes[id.index()];
        match node.files.last_mut() {
            Some(last) if last.time == time => last.size += size,
            _ => node.files.push(FileEntry { size, time }),
        }
        node.files_size += size;
        self.propagate_size(id, size);
    }

    /// Attach a previously allocated node beneath `parent`. The child must
    /// not already be attached anywhere; its accumulated `subtree_size` is
    /// propagated up the parent chain.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert_ne!(parent, child);
        debug_assert!(
            self.nodes[child.index()].parent.is_none(),
            "node is already attached"
        );
        let pos = self.nodes[parent.index()].children.len();
        self.nodes[parent.index()].children.push(child);
        let amount = {
            let node = &mut self.nodes[child.index()];
            node.parent = Some(parent);
            node.parent_pos = pos;
            node.subtree_size
        };
        self.propagate_size(parent, amount);
    }

    /// Sort a directory's files ascending by time and trim spare capacity.
    /// Called once per directory after all of its direct files have been
    /// appended; the node is read-only afterwards.
    pub fn finalize(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];
        node.files.sort_unstable_by_key(|entry| entry.time);
        node.files.shrink_to_fit();
        node.children.shrink_to_fit();
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].name
    }

    /// Direct files of this directory, sorted by time once finalized.
    pub fn files(&self, id: NodeId) -> &[FileEntry] {
        &self.nodes[id.index()].files
    }

    /// Number of direct file clusters.
    pub fn num_files(&self, id: NodeId) -> usize {
        self.nodes[id.index()].files.len()
    }

    /// Combined size of the direct files only.
    pub fn files_size(&self, id: NodeId) -> u64 {
        self.nodes[id.index()].files_size
    }

    /// Combined size of every file reachable from this node.
    pub fn subtree_size(&self, id: NodeId) -> u64 {
        self.nodes[id.index()].subtree_size
    }

    pub fn num_children(&self, id: NodeId) -> usize {
        self.nodes[id.index()].children.len()
    }

    pub fn child(&self, id: NodeId, i: usize) -> NodeId {
        self.nodes[id.index()].children[i]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Index of this node within its parent's child list.
    pub fn parent_pos(&self, id: NodeId) -> usize {
        self.nodes[id.index()].parent_pos
    }

    /// Iterate every [`FileEntry`] reachable from `id`, including all
    /// descendants, in ascending `time` order. Lazy and single-pass.
    pub fn subtree_iter(&self, id: NodeId) -> SubtreeIter<'_> {
        SubtreeIter::new(self, id)
    }

    fn propagate_size(&mut self, from: NodeId, amount: u64) {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = &mut self.nodes[id.index()];
            node.subtree_size += amount;
            current = node.parent;
        }
    }
}
