//! Serialized size of a document
//!
//! Documents are sized with the store's binary layout:
//!
//! ```text
//! document := int32 total_len, element*, 0x00
//! element  := u8 type, cstring name, value
//! int64    := 8 bytes
//! string   := int32 len, bytes, 0x00
//! array    := document keyed "0", "1", ...
//! ```
//!
//! The batch generator sizes filler with [`encoded_len`] and the in-memory
//! cluster accounts chunk bytes with it, so both agree on every document.

use crate::document::{Document, IndexedValue};

/// Largest document the router accepts (16 MiB).
pub const MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Field name of the primary key
pub const ID_FIELD: &str = "_id";
/// Field name of the partition key
pub const PARTITION_KEY_FIELD: &str = "_sk";
/// Field name of the filler string
pub const FILLER_FIELD: &str = "filler";
/// Field name of the sentinel marker
pub const MARKER_FIELD: &str = "marker";
/// Field names of the compound index pair
pub const INDEXED_FIELDS: [&str; 2] = ["a", "b"];

const LENGTH_PREFIX: usize = 4;
const TERMINATOR: usize = 1;
const INT64_LEN: usize = 8;

#[inline]
fn element_header(name_len: usize) -> usize {
    // type byte + name + NUL
    1 + name_len + 1
}

#[inline]
fn string_len(s: &str) -> usize {
    LENGTH_PREFIX + s.len() + TERMINATOR
}

fn decimal_digits(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

fn array_len(values: &[i64]) -> usize {
    let elements: usize = (0..values.len())
        .map(|i| element_header(decimal_digits(i)) + INT64_LEN)
        .sum();
    LENGTH_PREFIX + elements + TERMINATOR
}

fn indexed_value_len(value: &IndexedValue) -> usize {
    match value {
        IndexedValue::Int(_) => INT64_LEN,
        IndexedValue::Array(values) => array_len(values),
    }
}

/// Exact serialized size of `doc` in bytes.
pub fn encoded_len(doc: &Document) -> usize {
    let mut len = LENGTH_PREFIX + TERMINATOR;

    len += element_header(ID_FIELD.len()) + INT64_LEN;
    if doc.partition_key.is_some() {
        len += element_header(PARTITION_KEY_FIELD.len()) + INT64_LEN;
    }
    len += element_header(FILLER_FIELD.len()) + string_len(&doc.filler);
    if let Some(marker) = &doc.marker {
        len += element_header(MARKER_FIELD.len()) + string_len(marker);
    }
    if let Some(pair) = &doc.indexed {
        len += element_header(INDEXED_FIELDS[0].len()) + indexed_value_len(&pair.first);
        len += element_header(INDEXED_FIELDS[1].len()) + indexed_value_len(&pair.second);
    }

    len
}

/// Size of `{ _id, _sk, filler: "" }`: the fixed cost of every batch document.
pub fn base_overhead() -> usize {
    encoded_len(&Document::new(0, 0, String::new()))
}
