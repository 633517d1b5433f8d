//! Random batches and faults against the in-memory cluster

use bulkcheck::{
    expected_presence, ClusterConfig, DocumentReader, DocumentWriter, FaultLocation,
    InsertOptions, Predicate, StorageFaultMechanism,
};
use bulkcheck_engine::{choose_positions, corrupt, verify_sentinel};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::test_utils::*;

fn location() -> impl Strategy<Value = FaultLocation> {
    prop_oneof![Just(FaultLocation::Router), Just(FaultLocation::Storage)]
}

fn mechanism() -> impl Strategy<Value = StorageFaultMechanism> {
    prop_oneof![
        Just(StorageFaultMechanism::ParallelArrays),
        Just(StorageFaultMechanism::DuplicateSentinel)
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn persisted_state_matches_error_mode(
        n in 1i64..40,
        seed in any::<u64>(),
        faults in 0usize..6,
        force_first in any::<bool>(),
        force_last in any::<bool>(),
        location in location(),
        mechanism in mechanism(),
        continue_on_error in any::<bool>(),
        shards in 1usize..5,
    ) {
        let cluster = prepared_cluster(
            ClusterConfig::new().shards(shards).max_chunk_bytes(1_024),
        );
        let mut docs = spread_documents(n);
        let mut rng = StdRng::seed_from_u64(seed);
        let positions = choose_positions(&mut rng, docs.len(), faults, force_first, force_last);
        for &p in &positions {
            corrupt(&mut docs[p], location, mechanism);
        }

        let outcome = cluster
            .insert(&coll(), &docs, InsertOptions::new(continue_on_error))
            .unwrap();

        let expected = expected_presence(&docs, continue_on_error);
        prop_assert_eq!(presence(&cluster, &docs), expected.clone());
        prop_assert!(verify_sentinel(&cluster, &coll()).is_ok());

        let present = expected.iter().filter(|&&p| p).count() as u64;
        prop_assert_eq!(cluster.count(&coll(), &Predicate::All).unwrap(), present + 1);
        prop_assert_eq!(outcome.inserted, present);
        prop_assert_eq!(outcome.last_error.is_some(), !positions.is_empty());
    }
}
