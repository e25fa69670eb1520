//! Conversion between `&str` keys and the single-byte key alphabet.
//!
//! Code points up to U+00FF are stored as their Latin-1 byte. Anything above
//! that is replaced by [`SENTINEL`], which falls into the catch-all symbol
//! class. The reduction is lossy on purpose: `decode` renders every sentinel
//! as U+001A, never the original character.

/// Byte substituted for code points outside the single-byte range (ASCII SUB).
pub const SENTINEL: u8 = 0x1A;

/// Reduces `key` to the indexed byte alphabet, optionally lowercasing first.
pub fn encode(key: &str, fold_case: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(key.len());
    if fold_case {
        for c in key.chars().flat_map(char::to_lowercase) {
            out.push(reduce(c));
        }
    } else {
        out.extend(key.chars().map(reduce));
    }
    out
}

#[inline]
fn reduce(c: char) -> u8 {
    u8::try_from(u32::from(c)).unwrap_or(SENTINEL)
}

/// Renders indexed bytes back into a `String`, one char per byte.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// True if every char of `key` survives [`encode`] unchanged.
pub fn is_lossless(key: &str) -> bool {
    key.chars().all(|c| u32::from(c) <= 0xFF && c != char::from(SENTINEL))
}
