//! # fuzzy-radix
//!
//! An in-memory radix (PATRICIA) trie for search-as-you-type indexes over
//! large string sets such as addresses or place names.
//!
//! Three query modes are supported:
//!
//! - **Prefix search**: every key starting with the query.
//! - **Fuzzy search**: every key containing the query bytes in order with
//!   short gaps between them, pruned by per-node symbol-class bitmasks.
//! - **Longest prefix**: the longest inserted key that prefixes the input.
//!
//! ## Example
//!
//! ```rust
//! use fuzzy_radix::Trie;
//!
//! let mut trie: Trie<u32> = Trie::new();
//! trie.insert("magazine", 1).unwrap();
//! trie.insert("magsafe", 2).unwrap();
//!
//! let keys: Vec<String> = trie.prefix_search("mag").into_iter().map(|(k, _)| k).collect();
//! assert_eq!(keys, ["magazine", "magsafe"]);
//!
//! let fuzzy: Vec<String> = trie.fuzzy_search("msf").into_iter().map(|(k, _)| k).collect();
//! assert_eq!(fuzzy, ["magsafe"]);
//! ```
//!
//! Keys are reduced to single bytes before indexing; see [`key`] for how
//! characters above U+00FF are handled.

pub mod bitmask;
pub mod debug;
pub mod error;
pub mod key;
pub mod node;
pub mod shared;
pub mod trie;

pub use debug::Visit;
pub use error::TrieError;
pub use node::{Node, NodeId, NodeRef};
pub use shared::SharedTrie;
pub use trie::Trie;

/// Configuration for a [`Trie`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of key bytes a fuzzy match may skip between two
    /// consecutive matched query bytes before an attempt is dropped.
    pub fuzziness: usize,
    /// Lowercase keys and queries before indexing. When false, matching is
    /// case-sensitive, although bitmask pruning always folds case.
    pub fold_case: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fuzziness: 3,
            fold_case: false,
        }
    }
}

#[cfg(test)]
mod proptests;
