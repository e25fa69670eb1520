//! A trie behind a read-write lock.
//!
//! Searches take the read lock and may run concurrently; insertion takes the
//! write lock, so no search ever observes a half-finished split. Results are
//! cloned out because they cannot borrow from inside the lock.

use parking_lot::RwLock;

use crate::error::TrieError;
use crate::trie::Trie;
use crate::Config;

/// Thread-safe wrapper around [`Trie`] for a single writer and many readers.
pub struct SharedTrie<V> {
    inner: RwLock<Trie<V>>,
}

impl<V: Clone> SharedTrie<V> {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            inner: RwLock::new(Trie::with_config(config)),
        }
    }

    /// Inserts `key`, returning whether anything was inserted (false for an
    /// empty key).
    pub fn insert(&self, key: &str, content: V) -> Result<bool, TrieError> {
        let mut inner = self.inner.write();
        let inserted = inner.insert(key, content)?.is_some();
        Ok(inserted)
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.read().get(key).cloned()
    }

    pub fn prefix_search(&self, query: &str) -> Vec<(String, V)> {
        let inner = self.inner.read();
        inner
            .prefix_search(query)
            .into_iter()
            .map(|(k, v)| (k, v.clone()))
            .collect()
    }

    pub fn fuzzy_search(&self, query: &str) -> Vec<(String, V)> {
        let inner = self.inner.read();
        inner
            .fuzzy_search(query)
            .into_iter()
            .map(|(k, v)| (k, v.clone()))
            .collect()
    }

    pub fn longest_prefix(&self, input: &str) -> Option<(String, V)> {
        let inner = self.inner.read();
        inner.longest_prefix(input).map(|(k, v)| (k, v.clone()))
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Clones the current trie for lock-free reads.
    pub fn snapshot(&self) -> Trie<V> {
        self.inner.read().clone()
    }

    pub fn into_inner(self) -> Trie<V> {
        self.inner.into_inner()
    }
}

impl<V: Clone> Default for SharedTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> From<Trie<V>> for SharedTrie<V> {
    fn from(trie: Trie<V>) -> Self {
        Self {
            inner: RwLock::new(trie),
        }
    }
}
