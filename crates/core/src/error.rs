//! Error types for bulkcheck
//!
//! Three layers:
//! - [`StoreError`]: a store call itself failed (not a per-document rejection)
//! - [`ConfigError`]: configuration could not be loaded or is inconsistent
//! - [`HarnessError`]: anything that stops a run, including invariant violations
//!
//! Per-document write rejections are not errors. They are reported in
//! [`InsertOutcome`](crate::traits::InsertOutcome) and are the condition
//! under test.

use std::path::PathBuf;
use thiserror::Error;

use crate::document::{DocId, FaultStatus};
use crate::options::ScenarioOptions;
use crate::traits::WriteError;

/// Result type for store calls
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Failure of a store call
#[derive(Debug, Error)]
pub enum StoreError {
    /// Sharding was requested on a collection whose database is not enabled
    #[error("sharding is not enabled for database '{0}'")]
    ShardingNotEnabled(String),

    /// The collection already has a partition key
    #[error("collection '{0}' is already sharded")]
    AlreadySharded(String),

    /// Only the `_sk` integer field can partition documents
    #[error("unsupported partition key field '{0}'")]
    UnsupportedPartitionKey(String),

    /// Sharding an existing collection that already holds documents
    #[error("collection '{collection}' holds {count} documents; shard it while empty")]
    NotEmpty {
        /// Collection full name
        collection: String,
        /// Documents currently stored
        count: u64,
    },

    /// A single-document write was rejected
    #[error("write rejected: {0}")]
    Rejected(WriteError),

    /// The cluster was configured without shards
    #[error("cluster has no shards")]
    NoShards,
}

/// Configuration loading or validation failure
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unknown fault location name
    #[error("unknown fault location '{0}' (expected 'router' or 'storage')")]
    UnknownFaultLocation(String),

    /// Unknown storage fault mechanism name
    #[error("unknown storage fault mechanism '{0}' (expected 'parallel-arrays' or 'duplicate-sentinel')")]
    UnknownStorageFault(String),

    /// `min > max`
    #[error("invalid range for {name}: min {min} > max {max}")]
    InvalidRange {
        /// Setting name
        name: &'static str,
        /// Lower bound
        min: u64,
        /// Upper bound
        max: u64,
    },

    /// Any other inconsistent setting
    #[error("{0}")]
    Invalid(String),

    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`HarnessConfig`](crate::config::HarnessConfig)
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

fn presence(present: &bool) -> &'static str {
    if *present {
        "present"
    } else {
        "absent"
    }
}

/// Failure that stops a run
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Harness misconfiguration; aborts before any write
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// A store call failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Observed persisted state differs from the expected state
    #[error(
        "invariant violation: document {id} at position {position} ({status}) expected {}, observed count {observed}",
        presence(.expected_present)
    )]
    InvariantViolation {
        /// Document id
        id: DocId,
        /// Batch position (0-based)
        position: usize,
        /// Fault status of the document
        status: FaultStatus,
        /// Expected presence
        expected_present: bool,
        /// Documents matching the id
        observed: u64,
    },

    /// The sentinel document was lost, duplicated or altered
    #[error("sentinel corrupted: expected exactly one sentinel document, found {found} (intact: {intact})")]
    SentinelCorrupted {
        /// Documents matching the sentinel predicate
        found: u64,
        /// Whether exactly one document still has both the sentinel id and marker
        intact: bool,
    },

    /// A failure inside a scenario, with the scenario and trial it occurred in
    #[error("scenario [{scenario}] trial {trial}: {source}")]
    ScenarioFailed {
        /// Scenario options
        scenario: ScenarioOptions,
        /// Trial index (0-based)
        trial: u64,
        /// Underlying failure
        #[source]
        source: Box<HarnessError>,
    },
}

impl HarnessError {
    /// The innermost error, unwrapping scenario context
    pub fn root(&self) -> &HarnessError {
        match self {
            HarnessError::ScenarioFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this is a per-document or sentinel invariant violation
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self.root(),
            HarnessError::InvariantViolation { .. } | HarnessError::SentinelCorrupted { .. }
        )
    }
}
