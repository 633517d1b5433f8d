//! Public types for the bulkcheck API.
//!
//! This module re-exports types from internal crates with a clean public interface.

// ============================================================================
// Documents and sizing
// ============================================================================

pub use bulkcheck_core::{
    base_overhead, encoded_len, filler, DocId, Document, FaultStatus, IndexedPair, IndexedValue,
    MAX_DOCUMENT_SIZE, SENTINEL_ID, SENTINEL_MARKER,
};

// ============================================================================
// Scenario options and configuration
// ============================================================================

pub use bulkcheck_core::{
    ClusterConfig, FaultLocation, HarnessConfig, InclusiveRange, ScenarioOptions,
    StorageFaultMechanism,
};

// ============================================================================
// Store capabilities
// ============================================================================

pub use bulkcheck_core::{
    CollectionHandle, DatasetLifecycle, DocumentReader, DocumentWriter, IndexSpec, InsertOptions,
    InsertOutcome, Predicate, Store, WriteError, WriteErrorCode,
};

// ============================================================================
// Errors
// ============================================================================

pub use bulkcheck_core::{ConfigError, HarnessError, Result, StoreError, StoreResult};

// ============================================================================
// Harness
// ============================================================================

pub use bulkcheck_engine::{
    expected_presence, scenario_matrix, Batch, FaultPlan, FaultTemplate, Harness, RunReport,
    ScenarioFilter, ScenarioReport, TrialReport,
};

// ============================================================================
// In-memory cluster
// ============================================================================

pub use bulkcheck_storage::Cluster;
