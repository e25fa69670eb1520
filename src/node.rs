//! Trie nodes and the arena that owns them.
//!
//! Nodes live in a single `Vec` and refer to each other by [`NodeId`]. The
//! arena exclusively owns every node; `parent` is a plain index used for
//! upward navigation only, so there is no ownership cycle. Nodes are never
//! freed, which keeps every `NodeId` valid for the lifetime of the trie.

use std::fmt;
use std::ops::Index;

use tracing::trace;

use crate::bitmask::{gen_mask, Bitmask};
use crate::error::TrieError;

/// Index of a node inside its trie.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node, present in every trie.
    pub const ROOT: NodeId = NodeId(0);

    /// Position of the node in allocation order.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single trie node.
///
/// `bitmask` summarizes the symbol classes of `label` and of every
/// descendant label. A node is terminal exactly when it holds content.
#[derive(Clone, Debug)]
pub struct Node<V> {
    label: Vec<u8>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    content: Option<V>,
    bitmask: Bitmask,
}

impl<V> Node<V> {
    fn new(label: Vec<u8>, parent: Option<NodeId>) -> Self {
        Self {
            bitmask: gen_mask(&label),
            label,
            children: Vec::new(),
            parent,
            content: None,
        }
    }

    /// The compressed edge label from the parent. Empty only for the root.
    #[inline]
    pub fn label(&self) -> &[u8] {
        &self.label
    }

    /// Children in insertion order.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// True if an inserted key ends exactly at this node.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.content.is_some()
    }

    #[inline]
    pub fn content(&self) -> Option<&V> {
        self.content.as_ref()
    }

    #[inline]
    pub fn bitmask(&self) -> Bitmask {
        self.bitmask
    }
}

// =============================================================================
// Arena
// =============================================================================

pub(crate) struct NodeArena<V> {
    nodes: Vec<Node<V>>,
}

impl<V> NodeArena<V> {
    /// Creates an arena holding only an empty root.
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node::new(Vec::new(), None)],
        }
    }

    /// Number of allocated nodes, root included.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Approximate heap bytes held by nodes, labels and child lists.
    pub(crate) fn memory_usage(&self) -> usize {
        let per_node: usize = self
            .nodes
            .iter()
            .map(|n| n.label.capacity() + n.children.capacity() * std::mem::size_of::<NodeId>())
            .sum();
        self.nodes.capacity() * std::mem::size_of::<Node<V>>() + per_node
    }

    /// Splits leave the prefix label with its old capacity; this releases it.
    pub(crate) fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
        for n in &mut self.nodes {
            n.label.shrink_to_fit();
            n.children.shrink_to_fit();
        }
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<&Node<V>> {
        self.nodes.get(id.0)
    }

    /// Allocates a child of `parent` labelled `label` and appends it to the
    /// parent's child list.
    ///
    /// The child's bitmask covers its own label only. The parent's bitmask
    /// is not touched; the caller merges the new contribution into every
    /// ancestor on the insertion path.
    pub(crate) fn new_child(&mut self, parent: NodeId, label: &[u8]) -> NodeId {
        debug_assert!(!label.is_empty(), "non-root labels are never empty");
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(label.to_vec(), Some(parent)));
        self.nodes[parent.0].children.push(id);
        trace!(parent = parent.0, child = id.0, label_len = label.len(), "new child");
        id
    }

    /// Splits the label of `id` at byte offset `at`.
    ///
    /// `id` keeps `label[..at]`. Its children and content move to one new
    /// child labelled `label[at..]`, whose bitmask is rebuilt from the suffix
    /// and the rehomed children. Returns `id`, now the shorter node.
    /// Splitting at the end of the label moves nothing and returns `id`.
    pub(crate) fn split(&mut self, id: NodeId, at: usize) -> Result<NodeId, TrieError> {
        let len = self.nodes[id.0].label.len();
        if at == 0 || at > len {
            return Err(TrieError::InvalidIndex { at, len });
        }
        if at == len {
            return Ok(id);
        }

        let child = NodeId(self.nodes.len());
        let node = &mut self.nodes[id.0];
        let suffix = node.label.split_off(at);
        let children = std::mem::take(&mut node.children);
        let content = node.content.take();
        node.children.push(child);

        let mut bitmask = gen_mask(&suffix);
        for &grandchild in &children {
            let g = &mut self.nodes[grandchild.0];
            g.parent = Some(child);
            bitmask |= g.bitmask;
        }
        // Already a superset unless `id` was never summarized.
        self.nodes[id.0].bitmask |= bitmask;

        trace!(node = id.0, child = child.0, at, suffix_len = suffix.len(), "split");
        self.nodes.push(Node {
            label: suffix,
            children,
            parent: Some(id),
            content,
            bitmask,
        });
        Ok(id)
    }

    #[inline]
    pub(crate) fn merge_mask(&mut self, id: NodeId, mask: Bitmask) {
        self.nodes[id.0].bitmask |= mask;
    }

    /// Marks `id` terminal, returning any content it already held.
    #[inline]
    pub(crate) fn set_content(&mut self, id: NodeId, content: V) -> Option<V> {
        self.nodes[id.0].content.replace(content)
    }
}

impl<V> Index<NodeId> for NodeArena<V> {
    type Output = Node<V>;

    #[inline]
    fn index(&self, id: NodeId) -> &Node<V> {
        &self.nodes[id.0]
    }
}

impl<V: Clone> Clone for NodeArena<V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
        }
    }
}

// =============================================================================
// Borrowed handle
// =============================================================================

/// Read-only handle to a node, able to follow child and parent links.
pub struct NodeRef<'a, V> {
    arena: &'a NodeArena<V>,
    id: NodeId,
}

impl<'a, V> NodeRef<'a, V> {
    #[inline]
    pub(crate) fn new(arena: &'a NodeArena<V>, id: NodeId) -> Self {
        Self { arena, id }
    }

    #[inline]
    fn node(&self) -> &'a Node<V> {
        &self.arena[self.id]
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn label(&self) -> &'a [u8] {
        self.node().label()
    }

    #[inline]
    pub fn bitmask(&self) -> Bitmask {
        self.node().bitmask()
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.node().is_terminal()
    }

    #[inline]
    pub fn content(&self) -> Option<&'a V> {
        self.node().content()
    }

    #[inline]
    pub fn num_children(&self) -> usize {
        self.node().children().len()
    }

    /// The `i`-th child in insertion order.
    pub fn child(&self, i: usize) -> Option<NodeRef<'a, V>> {
        let id = *self.node().children().get(i)?;
        Some(NodeRef::new(self.arena, id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a, V>> + 'a {
        let arena = self.arena;
        self.node()
            .children()
            .iter()
            .map(move |&id| NodeRef::new(arena, id))
    }

    pub fn parent(&self) -> Option<NodeRef<'a, V>> {
        self.node().parent().map(|id| NodeRef::new(self.arena, id))
    }

    /// Full key from the root down to and including this node's label.
    pub fn path(&self) -> Vec<u8> {
        let mut labels = Vec::new();
        let mut cur = Some(*self);
        while let Some(n) = cur {
            labels.push(n.label());
            cur = n.parent();
        }
        labels.into_iter().rev().flatten().copied().collect()
    }
}

impl<V> Clone for NodeRef<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for NodeRef<'_, V> {}

impl<V: fmt::Debug> fmt::Debug for NodeRef<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id.0)
            .field("label", &String::from_utf8_lossy(self.label()))
            .field("children", &self.num_children())
            .field("content", &self.content())
            .field("bitmask", &format_args!("{:#034b}", self.bitmask()))
            .finish()
    }
}
