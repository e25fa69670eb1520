//! Diagnostics: a depth-first node visitor and a structural integrity check.
//!
//! Nothing here is used by insertion or search.

use std::collections::HashSet;
use std::ops::ControlFlow;

use tracing::trace;

use crate::bitmask::{contains, gen_mask};
use crate::node::NodeId;
use crate::trie::Trie;

/// One node as seen by [`Trie::walk_depth_first`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Visit<'a> {
    pub id: NodeId,
    pub label: &'a [u8],
    /// Children of the root are at depth 0.
    pub depth: usize,
    /// First child of its parent.
    pub is_first: bool,
    /// Last child of its parent.
    pub is_last: bool,
    pub num_children: usize,
}

impl<V> Trie<V> {
    /// Calls `f` for every non-root node, parents before children, siblings
    /// in insertion order. Returning `ControlFlow::Break` ends the walk.
    pub fn walk_depth_first<F>(&self, mut f: F)
    where
        F: FnMut(&Visit<'_>) -> ControlFlow<()>,
    {
        if self.walk_from(NodeId::ROOT, 0, &mut f).is_break() {
            trace!("depth-first walk stopped early");
        }
    }

    fn walk_from<F>(&self, id: NodeId, depth: usize, f: &mut F) -> ControlFlow<()>
    where
        F: FnMut(&Visit<'_>) -> ControlFlow<()>,
    {
        let children = self.arena[id].children();
        for (i, &child) in children.iter().enumerate() {
            let node = &self.arena[child];
            f(&Visit {
                id: child,
                label: node.label(),
                depth,
                is_first: i == 0,
                is_last: i + 1 == children.len(),
                num_children: node.children().len(),
            })?;
            self.walk_from(child, depth + 1, f)?;
        }
        ControlFlow::Continue(())
    }

    /// Verify tree integrity - returns list of issues found.
    pub fn verify_integrity(&self) -> Vec<String> {
        let mut issues = Vec::new();

        let root = &self.arena[NodeId::ROOT];
        if !root.label().is_empty() {
            issues.push("root has a non-empty label".to_string());
        }
        if root.parent().is_some() {
            issues.push("root has a parent".to_string());
        }
        if root.is_terminal() {
            issues.push("root is terminal".to_string());
        }

        let mut reachable = 1usize;
        let mut terminals = 0usize;
        let mut stack = vec![(NodeId::ROOT, Vec::<u8>::new())];
        while let Some((id, path)) = stack.pop() {
            let node = &self.arena[id];

            let mut expected = gen_mask(node.label());
            let mut first_bytes = HashSet::new();
            for &child in node.children() {
                let c = &self.arena[child];
                reachable += 1;
                expected |= c.bitmask();

                if c.parent() != Some(id) {
                    issues.push(format!(
                        "node {} under {:?} has parent {:?}, expected {}",
                        child.index(),
                        path,
                        c.parent().map(NodeId::index),
                        id.index()
                    ));
                }
                match c.label().first() {
                    None => issues.push(format!("empty label under {:?}", path)),
                    Some(&b) => {
                        if !first_bytes.insert(b) {
                            issues.push(format!(
                                "siblings under {:?} share first byte {:#04x}",
                                path, b
                            ));
                        }
                    }
                }

                let mut child_path = path.clone();
                child_path.extend_from_slice(c.label());
                stack.push((child, child_path));
            }

            if !contains(node.bitmask(), expected) {
                issues.push(format!(
                    "bitmask {:#034b} at {:?} misses {:#034b}",
                    node.bitmask(),
                    path,
                    expected & !node.bitmask()
                ));
            }
            if node.is_terminal() {
                terminals += 1;
            } else if id != NodeId::ROOT && node.children().is_empty() {
                issues.push(format!("leaf {:?} is not terminal", path));
            }
        }

        if reachable != self.node_count() + 1 {
            issues.push(format!(
                "{} nodes reachable, {} allocated",
                reachable,
                self.node_count() + 1
            ));
        }
        if terminals != self.len() {
            issues.push(format!(
                "{} terminal nodes but {} keys counted",
                terminals,
                self.len()
            ));
        }
        issues
    }
}
