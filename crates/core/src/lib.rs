//! Core types for bulkcheck
//!
//! This crate defines the foundational types shared by the store and the
//! harness:
//! - Document: the unit written in bulk batches (id, partition key, filler)
//! - Encoding: exact serialized size of a document
//! - Filler: doubling-table padding strings
//! - Options/Config: scenario dimensions and harness configuration
//! - Traits: the store capabilities the harness consumes
//! - Error: store, configuration and harness error types

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod document;
pub mod encoding;
pub mod error;
pub mod filler;
pub mod options;
pub mod traits;

pub use config::{ClusterConfig, HarnessConfig};
pub use document::{
    DocId, Document, FaultStatus, IndexedPair, IndexedValue, SENTINEL_ID, SENTINEL_MARKER,
};
pub use encoding::{base_overhead, encoded_len, MAX_DOCUMENT_SIZE};
pub use error::{ConfigError, HarnessError, Result, StoreError, StoreResult};
pub use filler::filler;
pub use options::{FaultLocation, InclusiveRange, ScenarioOptions, StorageFaultMechanism};
pub use traits::{
    CollectionHandle, DatasetLifecycle, DocumentReader, DocumentWriter, IndexSpec, InsertOptions,
    InsertOutcome, Predicate, Store, WriteError, WriteErrorCode,
};
