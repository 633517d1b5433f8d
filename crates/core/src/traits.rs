//! Store capabilities consumed by the harness
//!
//! The harness never implements a store. It writes batches through
//! [`DocumentWriter`], observes persisted state through [`DocumentReader`],
//! and prepares the dataset through [`DatasetLifecycle`]. All methods take
//! `&self`; implementations synchronize internally.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document::{DocId, Document};
use crate::error::StoreResult;
use crate::options::FaultLocation;

/// Names a collection inside a database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionHandle {
    /// Database name
    pub database: String,
    /// Collection name
    pub name: String,
}

impl CollectionHandle {
    /// Create a handle
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
        }
    }

    /// `database.collection`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }
}

impl fmt::Display for CollectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.name)
    }
}

/// Filter for [`DocumentReader::count`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Every document
    All,
    /// `_id == id`
    IdEquals(DocId),
    /// `marker == "sentinel"`
    SentinelMarker,
    /// `_id == 0` and `marker == "sentinel"` on the same document
    Sentinel,
}

impl Predicate {
    /// Evaluate against a document
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Predicate::All => true,
            Predicate::IdEquals(id) => doc.id == *id,
            Predicate::SentinelMarker => doc.carries_sentinel_marker(),
            Predicate::Sentinel => doc.is_sentinel(),
        }
    }
}

/// Secondary indexes the harness creates before the scenario loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexSpec {
    /// Compound index over `{ a: 1, b: 1 }`; arrays in both fields are unindexable
    CompoundPair,
    /// Unique index over `{ _sk: 1, marker: 1 }`, sparse on `marker`
    UniqueSentinel,
}

/// Options for a bulk insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InsertOptions {
    /// Keep writing later documents after a rejection
    pub continue_on_error: bool,
}

impl InsertOptions {
    /// Create insert options
    pub fn new(continue_on_error: bool) -> Self {
        Self { continue_on_error }
    }
}

/// Why a document was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WriteErrorCode {
    /// Router: no partition key on a sharded collection
    MissingPartitionKey,
    /// Router: document exceeds the maximum size
    DocumentTooLarge,
    /// Storage: unique index violation
    DuplicateKey,
    /// Storage: both compound index fields are arrays
    CannotIndexParallelArrays,
}

impl WriteErrorCode {
    /// Layer that raises this code
    pub fn layer(&self) -> FaultLocation {
        match self {
            WriteErrorCode::MissingPartitionKey | WriteErrorCode::DocumentTooLarge => {
                FaultLocation::Router
            }
            WriteErrorCode::DuplicateKey | WriteErrorCode::CannotIndexParallelArrays => {
                FaultLocation::Storage
            }
        }
    }
}

impl fmt::Display for WriteErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WriteErrorCode::MissingPartitionKey => "missing partition key",
            WriteErrorCode::DocumentTooLarge => "document too large",
            WriteErrorCode::DuplicateKey => "duplicate key",
            WriteErrorCode::CannotIndexParallelArrays => "cannot index parallel arrays",
        };
        f.write_str(s)
    }
}

/// A single rejected document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteError {
    /// Position in the submitted batch
    pub index: usize,
    /// Document id
    pub id: DocId,
    /// Rejection reason
    pub code: WriteErrorCode,
    /// Human-readable detail
    pub message: String,
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at index {} (_id {}): {}",
            self.code, self.index, self.id, self.message
        )
    }
}

/// Aggregate result of a bulk insert.
///
/// Best-effort only: a partitioned write may commit many documents while
/// reporting a single representative error. Correctness checks must observe
/// persisted state instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOutcome {
    /// Documents the store reports as written
    pub inserted: u64,
    /// Number of rejected documents the store noticed
    pub error_count: u64,
    /// Representative error, if any
    pub last_error: Option<WriteError>,
}

impl InsertOutcome {
    /// No rejection was reported
    pub fn is_clean(&self) -> bool {
        self.last_error.is_none()
    }
}

/// Bulk write capability.
pub trait DocumentWriter {
    /// Insert `batch` in order under `options`.
    ///
    /// With `continue_on_error == false` the store stops at the first rejected
    /// document and attempts nothing after it. With `true` it attempts every
    /// document. Rejections are reported in the outcome, not as `Err`.
    fn insert(
        &self,
        collection: &CollectionHandle,
        batch: &[Document],
        options: InsertOptions,
    ) -> StoreResult<InsertOutcome>;
}

/// Read capability; must reflect a settled view once `insert` has returned.
pub trait DocumentReader {
    /// Number of documents matching `predicate`
    fn count(&self, collection: &CollectionHandle, predicate: &Predicate) -> StoreResult<u64>;
}

/// Dataset and partitioning setup.
pub trait DatasetLifecycle {
    /// Allow collections in `database` to be partitioned
    fn enable_sharding(&self, database: &str) -> StoreResult<()>;

    /// Partition `collection` on the integer field `field`
    fn define_partition_key(&self, collection: &CollectionHandle, field: &str) -> StoreResult<()>;

    /// Create a secondary index if it does not exist
    fn ensure_index(&self, collection: &CollectionHandle, index: IndexSpec) -> StoreResult<()>;

    /// Remove every document but keep partitioning and indexes; returns the count removed
    fn remove_all(&self, collection: &CollectionHandle) -> StoreResult<u64>;

    /// Insert one document, failing with [`StoreError::Rejected`](crate::StoreError::Rejected) on rejection
    fn insert_one(&self, collection: &CollectionHandle, document: Document) -> StoreResult<()>;
}

/// Everything the harness needs from a store.
pub trait Store: DocumentWriter + DocumentReader + DatasetLifecycle {}

impl<T: DocumentWriter + DocumentReader + DatasetLifecycle + ?Sized> Store for T {}
