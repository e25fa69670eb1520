//! The trie: insertion, prefix search, fuzzy search and collection.

use std::fmt;

use tracing::{debug, trace};

use crate::bitmask::{contains, gen_mask};
use crate::error::TrieError;
use crate::key;
use crate::node::{NodeArena, NodeId, NodeRef};
use crate::Config;

/// A compressed prefix tree over byte keys with per-node bitmask summaries.
///
/// Keys are byte strings; the `&str` methods reduce their input through
/// [`key::encode`] first (see [`Config::fold_case`]). Results are returned
/// in depth-first, insertion order, not sorted.
pub struct Trie<V> {
    pub(crate) arena: NodeArena<V>,
    config: Config,
    string_count: usize,
}

impl<V> Trie<V> {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            arena: NodeArena::new(),
            config,
            string_count: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of distinct keys inserted.
    #[inline]
    pub fn len(&self) -> usize {
        self.string_count
    }

    /// Alias of [`Trie::len`].
    #[inline]
    pub fn string_count(&self) -> usize {
        self.string_count
    }

    /// Number of nodes created by insertion (the root is not counted).
    #[inline]
    pub fn node_count(&self) -> usize {
        self.arena.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arena[NodeId::ROOT].children().is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.arena.memory_usage()
    }

    pub fn shrink_to_fit(&mut self) {
        self.arena.shrink_to_fit();
    }

    pub fn root(&self) -> NodeRef<'_, V> {
        NodeRef::new(&self.arena, NodeId::ROOT)
    }

    /// Looks up a node by id. Ids stay valid for the life of the trie.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, V>> {
        self.arena.get(id).map(|_| NodeRef::new(&self.arena, id))
    }

    fn encode(&self, s: &str) -> Vec<u8> {
        key::encode(s, self.config.fold_case)
    }

    /// First child of `node` whose label starts with `byte`. Sibling labels
    /// never share a first byte, so there is at most one.
    fn find_child(&self, node: NodeId, byte: u8) -> Option<NodeId> {
        self.arena[node]
            .children()
            .iter()
            .copied()
            .find(|&child| self.arena[child].label().first() == Some(&byte))
    }
}

#[inline]
fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

// =============================================================================
// Insertion
// =============================================================================

impl<V> Trie<V> {
    /// Inserts `key` with `content`, returning the node the key ends at.
    ///
    /// An empty key inserts nothing and returns `Ok(None)`. Inserting an
    /// existing key replaces its content without changing [`Trie::len`].
    pub fn insert(&mut self, key: &str, content: V) -> Result<Option<NodeRef<'_, V>>, TrieError> {
        let key = self.encode(key);
        self.insert_bytes(&key, content)
    }

    pub fn insert_bytes(
        &mut self,
        key: &[u8],
        content: V,
    ) -> Result<Option<NodeRef<'_, V>>, TrieError> {
        if key.is_empty() {
            return Ok(None);
        }

        let target = self.place(key)?;
        if self.arena.set_content(target, content).is_none() {
            self.string_count += 1;
        }
        trace!(key_len = key.len(), node = target.index(), "insert");
        Ok(Some(NodeRef::new(&self.arena, target)))
    }

    /// Finds or creates the node at which `key` ends, splitting labels on the
    /// way. Every node on the path has `gen_mask` of the remaining input
    /// merged into its bitmask.
    fn place(&mut self, key: &[u8]) -> Result<NodeId, TrieError> {
        self.arena.merge_mask(NodeId::ROOT, gen_mask(key));

        let mut node = NodeId::ROOT;
        let mut rest = key;
        loop {
            if rest.is_empty() {
                return Ok(node);
            }

            let Some(child) = self.find_child(node, rest[0]) else {
                return Ok(self.arena.new_child(node, rest));
            };
            self.arena.merge_mask(child, gen_mask(rest));

            let label_len = self.arena[child].label().len();
            let common = common_prefix_len(self.arena[child].label(), rest);
            if common == label_len {
                node = child;
                rest = &rest[common..];
                continue;
            }

            // First bytes matched, so 0 < common < label_len.
            let branch = self.arena.split(child, common)?;
            if common == rest.len() {
                return Ok(branch);
            }
            return Ok(self.arena.new_child(branch, &rest[common..]));
        }
    }
}

// =============================================================================
// Exact and prefix lookups
// =============================================================================

impl<V> Trie<V> {
    /// Content stored for exactly `key`.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.get_bytes(&self.encode(key))
    }

    pub fn get_bytes(&self, key: &[u8]) -> Option<&V> {
        let mut node = NodeId::ROOT;
        let mut rest = key;
        while !rest.is_empty() {
            let child = self.find_child(node, rest[0])?;
            let label = self.arena[child].label();
            if !rest.starts_with(label) {
                return None;
            }
            node = child;
            rest = &rest[label.len()..];
        }
        self.arena[node].content()
    }

    /// Every key starting with `query`, paired with its content. An empty
    /// query returns the whole trie.
    pub fn prefix_search(&self, query: &str) -> Vec<(String, &V)> {
        decode_all(self.prefix_search_bytes(&self.encode(query)))
    }

    pub fn prefix_search_bytes(&self, query: &[u8]) -> Vec<(Vec<u8>, &V)> {
        let mut out = Vec::new();
        if let Some((node, mut prefix)) = self.descend_prefix(query) {
            self.collect(node, &mut prefix, &mut out);
        }
        debug!(query_len = query.len(), results = out.len(), "prefix search");
        out
    }

    /// Walks down while `query` lasts. Returns the node at which it ran out
    /// together with that node's full path.
    fn descend_prefix(&self, query: &[u8]) -> Option<(NodeId, Vec<u8>)> {
        let mut node = NodeId::ROOT;
        let mut path = Vec::with_capacity(query.len());
        let mut rest = query;
        while !rest.is_empty() {
            let child = self.find_child(node, rest[0])?;
            let label = self.arena[child].label();
            let common = common_prefix_len(label, rest);
            path.extend_from_slice(label);
            if common == rest.len() {
                return Some((child, path));
            }
            if common < label.len() {
                return None;
            }
            node = child;
            rest = &rest[common..];
        }
        Some((node, path))
    }

    /// The longest inserted key that is a prefix of `input`.
    pub fn longest_prefix(&self, input: &str) -> Option<(String, &V)> {
        self.longest_prefix_bytes(&self.encode(input))
            .map(|(k, v)| (key::decode(&k), v))
    }

    pub fn longest_prefix_bytes(&self, input: &[u8]) -> Option<(Vec<u8>, &V)> {
        let mut node = NodeId::ROOT;
        let mut consumed = 0;
        let mut best = None;
        while consumed < input.len() {
            let rest = &input[consumed..];
            let Some(child) = self.find_child(node, rest[0]) else {
                break;
            };
            let label = self.arena[child].label();
            if !rest.starts_with(label) {
                break;
            }
            consumed += label.len();
            node = child;
            if let Some(content) = self.arena[child].content() {
                best = Some((consumed, content));
            }
        }
        best.map(|(len, content)| (input[..len].to_vec(), content))
    }

    /// Depth-first collection of every terminal node under `id`, the node
    /// itself first, then its children in insertion order. `prefix` must be
    /// the full path of `id` and is restored before returning.
    pub(crate) fn collect<'a>(
        &'a self,
        id: NodeId,
        prefix: &mut Vec<u8>,
        out: &mut Vec<(Vec<u8>, &'a V)>,
    ) {
        let node = &self.arena[id];
        if let Some(content) = node.content() {
            out.push((prefix.clone(), content));
        }
        for &child in node.children() {
            let label = self.arena[child].label();
            prefix.extend_from_slice(label);
            self.collect(child, prefix, out);
            prefix.truncate(prefix.len() - label.len());
        }
    }
}

fn decode_all<V>(found: Vec<(Vec<u8>, &V)>) -> Vec<(String, &V)> {
    found
        .into_iter()
        .map(|(k, v)| (key::decode(&k), v))
        .collect()
}

// =============================================================================
// Fuzzy search
// =============================================================================

/// Progress of one match attempt: query bytes matched so far, and label
/// bytes scanned since the last one matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cursor {
    matched: usize,
    gap: usize,
}

/// Every attempt still alive along the current path, at most one per
/// `matched` value. A new attempt opens at each byte equal to `query[0]`.
type Attempts = Vec<Cursor>;

struct FuzzyWalk<'a, 'q, V> {
    trie: &'a Trie<V>,
    query: &'q [u8],
    fuzziness: usize,
    path: Vec<u8>,
    out: Vec<(Vec<u8>, &'a V)>,
    visited: usize,
}

/// Keeps `cursor` unless an attempt with the same progress and a smaller
/// gap is already live.
fn keep(attempts: &mut Attempts, cursor: Cursor) {
    match attempts.iter_mut().find(|c| c.matched == cursor.matched) {
        Some(c) => c.gap = c.gap.min(cursor.gap),
        None => attempts.push(cursor),
    }
}

impl<'a, V> FuzzyWalk<'a, '_, V> {
    /// Feeds one key byte to every live attempt. Returns true once any
    /// attempt has matched the whole query.
    fn step(&self, attempts: &mut Attempts, byte: u8) -> bool {
        let mut next = Attempts::with_capacity(attempts.len() + 1);
        for &c in attempts.iter() {
            if byte == self.query[c.matched] {
                keep(&mut next, Cursor { matched: c.matched + 1, gap: 0 });
            } else if c.gap < self.fuzziness {
                keep(&mut next, Cursor { matched: c.matched, gap: c.gap + 1 });
            }
        }
        if byte == self.query[0] {
            keep(&mut next, Cursor { matched: 1, gap: 0 });
        }
        *attempts = next;
        attempts.iter().any(|c| c.matched == self.query.len())
    }

    fn visit_children(&mut self, parent: NodeId, attempts: &Attempts) {
        let trie = self.trie;
        // The furthest attempt needs the fewest classes; any child that
        // lacks even those cannot complete a match.
        let furthest = attempts.iter().map(|c| c.matched).max().unwrap_or(0);
        let needle = gen_mask(&self.query[furthest..]);
        for &child in trie.arena[parent].children() {
            if contains(trie.arena[child].bitmask(), needle) {
                self.visit(child, attempts.clone());
            }
        }
    }

    fn visit(&mut self, id: NodeId, mut attempts: Attempts) {
        self.visited += 1;
        let trie = self.trie;
        let label = trie.arena[id].label();
        self.path.extend_from_slice(label);

        let mut complete = false;
        for &byte in label {
            if self.step(&mut attempts, byte) {
                complete = true;
                break;
            }
        }

        if complete {
            trie.collect(id, &mut self.path, &mut self.out);
        } else {
            self.visit_children(id, &attempts);
        }
        self.path.truncate(self.path.len() - label.len());
    }
}

impl<V> Trie<V> {
    /// Keys containing the bytes of `query` in order, with at most
    /// [`Config::fuzziness`] unmatched bytes between consecutive matches.
    ///
    /// Children are only entered when their subtree bitmask contains every
    /// symbol class still needed. An attempt starts at every byte equal to
    /// the first query byte, so a key holding `query` contiguously is always
    /// found. Within one attempt matching is greedy and never backtracks,
    /// so some keys holding `query` as a sparse subsequence are not
    /// reported. An empty query returns nothing.
    pub fn fuzzy_search(&self, query: &str) -> Vec<(String, &V)> {
        decode_all(self.fuzzy_search_bytes(&self.encode(query)))
    }

    pub fn fuzzy_search_bytes(&self, query: &[u8]) -> Vec<(Vec<u8>, &V)> {
        if query.is_empty() || self.is_empty() {
            return Vec::new();
        }

        let mut walk = FuzzyWalk {
            trie: self,
            query,
            fuzziness: self.config.fuzziness,
            path: Vec::new(),
            out: Vec::new(),
            visited: 0,
        };
        walk.visit_children(NodeId::ROOT, &Attempts::new());
        debug!(
            query_len = query.len(),
            visited = walk.visited,
            results = walk.out.len(),
            "fuzzy search"
        );
        walk.out
    }
}

// =============================================================================
// Trait impls
// =============================================================================

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for Trie<V> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena.clone(),
            config: self.config.clone(),
            string_count: self.string_count,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Trie<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.prefix_search_bytes(b"")
                    .into_iter()
                    .map(|(k, v)| (key::decode(&k), v)),
            )
            .finish()
    }
}
