//! Hand-built batches with known expected presence

use bulkcheck::{
    expected_presence, ClusterConfig, DocumentWriter, FaultLocation, InsertOptions,
    StorageFaultMechanism,
};
use bulkcheck_engine::{choose_positions, corrupt, verify_batch, verify_sentinel};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::test_utils::*;

const T: bool = true;
const F: bool = false;

fn run(
    location: FaultLocation,
    mechanism: StorageFaultMechanism,
    positions: &[usize],
    continue_on_error: bool,
) -> Vec<bool> {
    let cluster = prepared_cluster(ClusterConfig::new().shards(3).initial_chunks_per_shard(2));
    let mut docs = spread_documents(5);
    for &p in positions {
        corrupt(&mut docs[p], location, mechanism);
    }

    cluster
        .insert(&coll(), &docs, InsertOptions::new(continue_on_error))
        .unwrap();

    let observed = presence(&cluster, &docs);
    assert_eq!(observed, expected_presence(&docs, continue_on_error));
    verify_batch(&cluster, &coll(), &docs, continue_on_error).unwrap();
    verify_sentinel(&cluster, &coll()).unwrap();
    observed
}

#[test]
fn router_fault_stop_on_error() {
    let observed = run(
        FaultLocation::Router,
        StorageFaultMechanism::ParallelArrays,
        &[2],
        false,
    );
    assert_eq!(observed, vec![T, T, F, F, F]);
}

#[test]
fn router_fault_continue_on_error() {
    let observed = run(
        FaultLocation::Router,
        StorageFaultMechanism::ParallelArrays,
        &[2],
        true,
    );
    assert_eq!(observed, vec![T, T, F, T, T]);
}

#[test]
fn storage_fault_stop_on_error() {
    let observed = run(
        FaultLocation::Storage,
        StorageFaultMechanism::ParallelArrays,
        &[2],
        false,
    );
    assert_eq!(observed, vec![T, T, F, F, F]);
}

#[test]
fn storage_fault_continue_on_error() {
    let observed = run(
        FaultLocation::Storage,
        StorageFaultMechanism::ParallelArrays,
        &[2],
        true,
    );
    assert_eq!(observed, vec![T, T, F, T, T]);
}

#[test]
fn forced_first_and_last_continue_on_error() {
    let mut rng = StdRng::seed_from_u64(1);
    let positions = choose_positions(&mut rng, 5, 2, true, true);
    assert_eq!(positions.as_slice(), &[0, 4]);

    let observed = run(
        FaultLocation::Storage,
        StorageFaultMechanism::ParallelArrays,
        &positions,
        true,
    );
    assert_eq!(observed, vec![F, T, T, T, F]);
}

#[test]
fn forced_first_stop_on_error_writes_nothing() {
    let observed = run(
        FaultLocation::Router,
        StorageFaultMechanism::ParallelArrays,
        &[0],
        false,
    );
    assert_eq!(observed, vec![F; 5]);
}

#[test]
fn forced_last_stop_on_error_keeps_prefix() {
    let observed = run(
        FaultLocation::Storage,
        StorageFaultMechanism::ParallelArrays,
        &[4],
        false,
    );
    assert_eq!(observed, vec![T, T, T, T, F]);
}

#[test]
fn duplicate_sentinel_continue_on_error() {
    let observed = run(
        FaultLocation::Storage,
        StorageFaultMechanism::DuplicateSentinel,
        &[1, 3],
        true,
    );
    assert_eq!(observed, vec![T, F, T, F, T]);
}

#[test]
fn duplicate_sentinel_stop_on_error() {
    let observed = run(
        FaultLocation::Storage,
        StorageFaultMechanism::DuplicateSentinel,
        &[3],
        false,
    );
    assert_eq!(observed, vec![T, T, T, F, F]);
}

#[test]
fn clean_batch_is_fully_written() {
    for continue_on_error in [false, true] {
        let observed = run(
            FaultLocation::Router,
            StorageFaultMechanism::ParallelArrays,
            &[],
            continue_on_error,
        );
        assert_eq!(observed, vec![T; 5]);
    }
}
