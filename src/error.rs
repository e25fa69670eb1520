/// Errors raised by structural trie operations.
///
/// Queries never fail; these only surface if an internal invariant is broken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrieError {
    /// A split was requested at an offset outside `1..=len` of the node label.
    #[error("cannot split label of length {len} at offset {at}")]
    InvalidIndex {
        /// Requested split offset.
        at: usize,
        /// Length of the label being split.
        len: usize,
    },
}
