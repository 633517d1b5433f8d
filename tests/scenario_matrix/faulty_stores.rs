//! Stores that break an invariant must fail the run

use bulkcheck::{
    Cluster, CollectionHandle, DatasetLifecycle, Document, DocumentReader, DocumentWriter,
    FaultLocation, Harness, HarnessConfig, HarnessError, IndexSpec, InsertOptions, InsertOutcome,
    Predicate, ScenarioOptions, StoreResult,
};

use crate::test_utils::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Misbehavior {
    /// Keeps writing after a rejection in stop-on-error mode
    IgnoresStopOnError,
    /// Stops at the first rejection even in continue-on-error mode
    AlwaysStops,
    /// Acknowledges the sentinel insert without storing it
    DropsSentinel,
    /// Fills in a missing partition key instead of rejecting
    RepairsRouterFaults,
    /// Silently loses the last document of every batch
    LosesLastDocument,
}

struct FaultyStore {
    inner: Cluster,
    misbehavior: Misbehavior,
}

impl DocumentWriter for FaultyStore {
    fn insert(
        &self,
        collection: &CollectionHandle,
        batch: &[Document],
        options: InsertOptions,
    ) -> StoreResult<InsertOutcome> {
        match self.misbehavior {
            Misbehavior::IgnoresStopOnError => {
                self.inner.insert(collection, batch, InsertOptions::new(true))
            }
            Misbehavior::AlwaysStops => {
                self.inner.insert(collection, batch, InsertOptions::new(false))
            }
            Misbehavior::RepairsRouterFaults => {
                let repaired: Vec<Document> = batch
                    .iter()
                    .cloned()
                    .map(|mut d| {
                        d.partition_key.get_or_insert(d.id);
                        d
                    })
                    .collect();
                self.inner.insert(collection, &repaired, options)
            }
            Misbehavior::LosesLastDocument => {
                let kept = &batch[..batch.len().saturating_sub(1)];
                self.inner.insert(collection, kept, options)
            }
            Misbehavior::DropsSentinel => self.inner.insert(collection, batch, options),
        }
    }
}

impl DocumentReader for FaultyStore {
    fn count(&self, collection: &CollectionHandle, predicate: &Predicate) -> StoreResult<u64> {
        self.inner.count(collection, predicate)
    }
}

impl DatasetLifecycle for FaultyStore {
    fn enable_sharding(&self, database: &str) -> StoreResult<()> {
        self.inner.enable_sharding(database)
    }

    fn define_partition_key(&self, collection: &CollectionHandle, field: &str) -> StoreResult<()> {
        self.inner.define_partition_key(collection, field)
    }

    fn ensure_index(&self, collection: &CollectionHandle, index: IndexSpec) -> StoreResult<()> {
        self.inner.ensure_index(collection, index)
    }

    fn remove_all(&self, collection: &CollectionHandle) -> StoreResult<u64> {
        self.inner.remove_all(collection)
    }

    fn insert_one(&self, collection: &CollectionHandle, document: Document) -> StoreResult<()> {
        if self.misbehavior == Misbehavior::DropsSentinel && document.is_sentinel() {
            return Ok(());
        }
        self.inner.insert_one(collection, document)
    }
}

/// At least five documents per batch and at least one fault
fn config() -> HarnessConfig {
    small_config(21)
        .batch_sizes(5_000, 10_000)
        .document_sizes(500, 1_000)
        .fault_counts(1, 2)
}

fn scenario(continue_on_error: bool, fault_location: FaultLocation) -> ScenarioOptions {
    ScenarioOptions {
        continue_on_error,
        fault_location,
        force_first_fault: true,
        force_last_fault: false,
        scramble_partition_key: true,
    }
}

fn run(misbehavior: Misbehavior, config: HarnessConfig, options: ScenarioOptions) -> HarnessError {
    let store = FaultyStore {
        inner: Cluster::new(config.cluster.clone()).unwrap(),
        misbehavior,
    };
    let mut harness = Harness::new(&store, config).unwrap();
    let err = harness
        .run_scenario(options)
        .err()
        .expect("misbehaving store passed");

    assert!(err.is_invariant_violation(), "unexpected error: {err}");
    match &err {
        HarnessError::ScenarioFailed { scenario, trial, .. } => {
            assert_eq!(*scenario, options);
            assert_eq!(*trial, 0);
        }
        other => panic!("missing scenario context: {other}"),
    }
    err
}

#[test]
fn ignoring_stop_on_error_is_caught() {
    let err = run(
        Misbehavior::IgnoresStopOnError,
        config(),
        scenario(false, FaultLocation::Router),
    );
    assert!(matches!(
        err.root(),
        HarnessError::InvariantViolation { expected_present: false, observed: 1, .. }
    ));
}

#[test]
fn stopping_under_continue_on_error_is_caught() {
    let err = run(
        Misbehavior::AlwaysStops,
        config(),
        scenario(true, FaultLocation::Storage),
    );
    assert!(matches!(
        err.root(),
        HarnessError::InvariantViolation { expected_present: true, observed: 0, .. }
    ));
}

#[test]
fn lost_sentinel_is_caught() {
    let err = run(
        Misbehavior::DropsSentinel,
        config(),
        scenario(true, FaultLocation::Router),
    );
    assert!(matches!(
        err.root(),
        HarnessError::SentinelCorrupted { found: 0, intact: false }
    ));
}

#[test]
fn accepting_router_faults_is_caught() {
    let err = run(
        Misbehavior::RepairsRouterFaults,
        config(),
        scenario(true, FaultLocation::Router),
    );
    match err.root() {
        HarnessError::InvariantViolation {
            position,
            status,
            expected_present,
            ..
        } => {
            assert_eq!(*position, 0);
            assert!(status.is_faulted());
            assert!(!expected_present);
        }
        other => panic!("unexpected root: {other}"),
    }
}

#[test]
fn lost_write_is_caught() {
    let err = run(
        Misbehavior::LosesLastDocument,
        config().fault_counts(0, 0),
        ScenarioOptions {
            force_first_fault: false,
            ..scenario(true, FaultLocation::Router)
        },
    );
    assert!(matches!(
        err.root(),
        HarnessError::InvariantViolation { expected_present: true, observed: 0, .. }
    ));
}
