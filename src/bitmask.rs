//! Alphabet reduction and 32-bit symbol-class presence masks.
//!
//! Every byte is folded into one of 32 symbol classes so that the set of
//! classes occurring in a label (or an entire subtree) fits in a `u32`:
//!
//! - `a`..=`z` / `A`..=`Z` map to classes 1..=26 (case folded)
//! - digits are folded pairwise: `0`,`1` -> 27, `2`,`3` -> 28, ..., `8`,`9` -> 31
//! - everything else maps to the catch-all class 32
//!
//! Class `k` occupies bit `k - 1`. The mask over-approximates: a set bit only
//! says that *some* byte of that class occurs.

/// A symbol class in `1..=32`.
pub type SymbolClass = u8;

/// Presence mask over symbol classes.
pub type Bitmask = u32;

/// Class assigned to every byte outside letters and digits.
pub const CATCH_ALL: SymbolClass = 32;

const FIRST_DIGIT_CLASS: SymbolClass = 27;

/// Maps a byte to its symbol class.
#[inline]
pub fn class_of(byte: u8) -> SymbolClass {
    match byte {
        b'a'..=b'z' => byte - b'a' + 1,
        b'A'..=b'Z' => byte - b'A' + 1,
        b'0'..=b'9' => FIRST_DIGIT_CLASS + (byte - b'0') / 2,
        _ => CATCH_ALL,
    }
}

#[inline]
fn bit_of(class: SymbolClass) -> Bitmask {
    debug_assert!((1..=32).contains(&class));
    1 << (class - 1)
}

/// Folds [`class_of`] over `bytes`. The empty sequence yields `0`.
#[inline]
pub fn gen_mask(bytes: &[u8]) -> Bitmask {
    bytes.iter().fold(0, |mask, &b| mask | bit_of(class_of(b)))
}

/// Returns true if every bit set in `needle` is also set in `haystack`.
#[inline]
pub fn contains(haystack: Bitmask, needle: Bitmask) -> bool {
    haystack & needle == needle
}
