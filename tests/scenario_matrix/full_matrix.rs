//! Full scenario runs against the in-memory cluster

use std::io::Write;

use bulkcheck::{
    Cluster, ClusterConfig, DocumentReader, FaultLocation, Harness, HarnessConfig, Predicate,
    ScenarioFilter, StorageFaultMechanism, SENTINEL_ID,
};

use crate::test_utils::*;

fn run_all(config: HarnessConfig, filter: &ScenarioFilter) -> bulkcheck::RunReport {
    let cluster = Cluster::new(config.cluster.clone()).unwrap();
    let mut harness = Harness::new(&cluster, config).unwrap();
    harness.run(filter).unwrap()
}

#[test]
fn whole_matrix_passes() {
    let report = run_all(small_config(11), &ScenarioFilter::all());
    assert_eq!(report.scenarios.len(), 32);
    assert_eq!(report.trials(), 32 * 4);
    assert!(report.documents() > 0);
    assert!(report.faults() > 0);
}

#[test]
fn whole_matrix_passes_with_duplicate_sentinel_faults() {
    let config = small_config(12).storage_fault(StorageFaultMechanism::DuplicateSentinel);
    let report = run_all(config, &ScenarioFilter::all());
    assert_eq!(report.scenarios.len(), 32);
}

#[test]
fn many_shards_and_small_chunks() {
    let config = small_config(13).cluster(
        ClusterConfig::new()
            .shards(5)
            .max_chunk_bytes(4_096)
            .initial_chunks_per_shard(3),
    );
    let filter = ScenarioFilter {
        scramble_partition_key: Some(true),
        ..ScenarioFilter::all()
    };
    let report = run_all(config, &filter);
    assert_eq!(report.scenarios.len(), 16);
}

#[test]
fn same_seed_same_batches() {
    let first = run_all(small_config(14), &ScenarioFilter::all());
    let second = run_all(small_config(14), &ScenarioFilter::all());

    assert_ne!(first.run_id, second.run_id);
    for (a, b) in first.scenarios.iter().zip(&second.scenarios) {
        assert_eq!(a.options, b.options);
        assert_eq!(a.totals, b.totals);
    }
}

#[test]
fn filtered_run_keeps_matrix_order() {
    let filter = ScenarioFilter {
        fault_location: Some(FaultLocation::Storage),
        force_first_fault: Some(true),
        ..ScenarioFilter::all()
    };
    let report = run_all(small_config(15), &filter);
    assert_eq!(report.scenarios.len(), 8);
    assert!(!report.scenarios[0].options.continue_on_error);
    assert!(report.scenarios[7].options.continue_on_error);
}

#[test]
fn collection_holds_last_scenario_and_sentinel() {
    let config = small_config(16);
    let cluster = Cluster::new(config.cluster.clone()).unwrap();
    let mut harness = Harness::new(&cluster, config).unwrap();
    let filter = ScenarioFilter {
        continue_on_error: Some(true),
        fault_location: Some(FaultLocation::Router),
        force_first_fault: Some(false),
        force_last_fault: Some(false),
        scramble_partition_key: Some(false),
    };
    let report = harness.run(&filter).unwrap();
    let totals = &report.scenarios[0].totals;

    let stored = cluster.count(&coll(), &Predicate::All).unwrap();
    assert_eq!(stored, totals.present + 1);
    assert!(cluster.find_by_id(&coll(), SENTINEL_ID).unwrap().is_sentinel());
}

#[test]
fn config_file_drives_run() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
iterations = 2
seed = 17
storage_fault = "duplicate-sentinel"

[batch_sizes]
min = 500
max = 5000

[document_sizes]
min = 44
max = 1000

[fault_counts]
min = 1
max = 2

[cluster]
shards = 3
max_chunk_bytes = 2048
"#
    )
    .unwrap();

    let config = HarnessConfig::from_file(file.path()).unwrap();
    assert_eq!(config.cluster.shards, 3);
    let report = run_all(config, &ScenarioFilter::all());
    assert_eq!(report.seed, 17);
    assert_eq!(report.trials(), 64);
}
