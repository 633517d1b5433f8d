//! Padding strings of exact length
//!
//! Built from a doubling table: `T[0] = "x"`, `T[i] = T[i-1] + T[i-1]`.
//! A string of length `n` is the concatenation of `T[i]` for every set bit
//! `i` of `n`, so each call performs at most one append per bit instead of
//! one per character.

use once_cell::sync::Lazy;

/// Number of table entries; the largest is `2^(TABLE_BITS - 1)` bytes.
const TABLE_BITS: usize = 21;

static TABLE: Lazy<Vec<String>> = Lazy::new(|| {
    let mut table: Vec<String> = Vec::with_capacity(TABLE_BITS);
    table.push("x".to_string());
    for i in 1..TABLE_BITS {
        let prev = &table[i - 1];
        let mut next = String::with_capacity(prev.len() * 2);
        next.push_str(prev);
        next.push_str(prev);
        table.push(next);
    }
    table
});

/// Return a string of exactly `len` characters.
///
/// Bits above the largest table entry are covered by repeating that entry.
/// `len == 0` yields the empty string.
pub fn filler(len: usize) -> String {
    if len == 0 {
        return String::new();
    }

    let table = &*TABLE;
    let top = table.len() - 1;
    let mut out = String::with_capacity(len);

    for _ in 0..(len >> top) {
        out.push_str(&table[top]);
    }
    for (bit, chunk) in table.iter().enumerate().take(top) {
        if len & (1 << bit) != 0 {
            out.push_str(chunk);
        }
    }

    out
}
