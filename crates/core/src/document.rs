//! Document model
//!
//! A batch document is `{ _id, _sk, filler }`. Storage faults add attributes
//! that only a storage node rejects: a pair of arrays under the compound
//! index (`a`, `b`), or a copy of the sentinel's marker.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::options::FaultLocation;

/// Document identifier, unique for the lifetime of a scenario run.
pub type DocId = i64;

/// Id of the sentinel document seeded at the start of every scenario.
///
/// Batch ids start at 1, so the sentinel never collides with them.
pub const SENTINEL_ID: DocId = 0;

/// Marker value carried by the sentinel document.
pub const SENTINEL_MARKER: &str = "sentinel";

/// Value of one field covered by the compound secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexedValue {
    /// Scalar integer
    Int(i64),
    /// Integer array (makes the index multikey)
    Array(Vec<i64>),
}

impl IndexedValue {
    /// Whether this value is an array
    pub fn is_array(&self) -> bool {
        matches!(self, IndexedValue::Array(_))
    }
}

/// The two fields covered by the compound secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexedPair {
    /// Field `a`
    pub first: IndexedValue,
    /// Field `b`
    pub second: IndexedValue,
}

impl IndexedPair {
    /// Both fields as single-element arrays; no index can hold this shape.
    pub fn parallel_arrays() -> Self {
        Self {
            first: IndexedValue::Array(vec![1]),
            second: IndexedValue::Array(vec![1]),
        }
    }

    /// True when both fields are arrays
    pub fn is_parallel(&self) -> bool {
        self.first.is_array() && self.second.is_array()
    }
}

/// A document submitted in a bulk batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Primary key (`_id`)
    pub id: DocId,
    /// Partition key (`_sk`); `None` means the router cannot place it
    pub partition_key: Option<i64>,
    /// Padding used to reach a target serialized size
    pub filler: String,
    /// Marker covered by the unique sentinel index
    pub marker: Option<String>,
    /// Fields covered by the compound secondary index
    pub indexed: Option<IndexedPair>,
}

impl Document {
    /// Create a well-formed document.
    pub fn new(id: DocId, partition_key: i64, filler: String) -> Self {
        Self {
            id,
            partition_key: Some(partition_key),
            filler,
            marker: None,
            indexed: None,
        }
    }

    /// The sentinel document: `{ _id: 0, _sk: 0, filler: "", marker: "sentinel" }`.
    pub fn sentinel() -> Self {
        Self {
            id: SENTINEL_ID,
            partition_key: Some(0),
            filler: String::new(),
            marker: Some(SENTINEL_MARKER.to_string()),
            indexed: None,
        }
    }

    /// Whether this is the sentinel document itself (not a copy of its marker).
    pub fn is_sentinel(&self) -> bool {
        self.id == SENTINEL_ID && self.carries_sentinel_marker()
    }

    /// Whether the document carries the sentinel's marker
    pub fn carries_sentinel_marker(&self) -> bool {
        self.marker.as_deref() == Some(SENTINEL_MARKER)
    }

    /// Whether both compound index fields are arrays
    pub fn has_parallel_arrays(&self) -> bool {
        self.indexed.as_ref().map_or(false, IndexedPair::is_parallel)
    }

    /// Classify the document by its shape.
    ///
    /// A missing partition key is a router fault. Parallel index arrays, or a
    /// copy of the sentinel marker on any document other than the sentinel,
    /// are storage faults. Everything else is well-formed.
    pub fn status(&self) -> FaultStatus {
        if self.partition_key.is_none() {
            FaultStatus::Faulted(FaultLocation::Router)
        } else if self.has_parallel_arrays() || (self.carries_sentinel_marker() && !self.is_sentinel())
        {
            FaultStatus::Faulted(FaultLocation::Storage)
        } else {
            FaultStatus::WellFormed
        }
    }

    /// Shorthand for `status().is_faulted()`
    pub fn is_faulted(&self) -> bool {
        self.status().is_faulted()
    }
}

/// Fault status of a batch document, derived from its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultStatus {
    /// Router and storage both accept it
    WellFormed,
    /// Rejected at the given layer
    Faulted(FaultLocation),
}

impl FaultStatus {
    /// Whether the document is expected to be rejected
    pub fn is_faulted(&self) -> bool {
        matches!(self, FaultStatus::Faulted(_))
    }
}

impl fmt::Display for FaultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultStatus::WellFormed => write!(f, "well-formed"),
            FaultStatus::Faulted(location) => write!(f, "{} fault", location),
        }
    }
}
