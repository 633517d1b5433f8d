//! Shared helpers for the scenario matrix suite

use bulkcheck::{
    Cluster, ClusterConfig, CollectionHandle, DatasetLifecycle, Document, DocumentReader,
    HarnessConfig, IndexSpec, Predicate,
};

pub const DATABASE: &str = "testDatabase";
pub const COLLECTION: &str = "testCollection";

pub fn coll() -> CollectionHandle {
    CollectionHandle::new(DATABASE, COLLECTION)
}

/// Harness settings small enough to run the whole matrix quickly
pub fn small_config(seed: u64) -> HarnessConfig {
    HarnessConfig::new()
        .iterations(4)
        .batch_sizes(1_000, 30_000)
        .document_sizes(44, 3_000)
        .fault_counts(0, 4)
        .seed(seed)
        .cluster(ClusterConfig::new().max_chunk_bytes(16 * 1024))
}

/// Cluster with the collection partitioned and both indexes created
pub fn prepared_cluster(config: ClusterConfig) -> Cluster {
    let cluster = Cluster::new(config).unwrap();
    cluster.enable_sharding(DATABASE).unwrap();
    cluster.define_partition_key(&coll(), "_sk").unwrap();
    cluster.ensure_index(&coll(), IndexSpec::CompoundPair).unwrap();
    cluster.ensure_index(&coll(), IndexSpec::UniqueSentinel).unwrap();
    cluster.insert_one(&coll(), Document::sentinel()).unwrap();
    cluster
}

/// Documents `1..=n` with keys spread over the 24-bit key space
pub fn spread_documents(n: i64) -> Vec<Document> {
    (1..=n)
        .map(|id| Document::new(id, (id * 0x33_3333) & 0xff_ffff, "f".repeat(64)))
        .collect()
}

pub fn presence<R: DocumentReader + ?Sized>(reader: &R, docs: &[Document]) -> Vec<bool> {
    docs.iter()
        .map(|d| reader.count(&coll(), &Predicate::IdEquals(d.id)).unwrap() == 1)
        .collect()
}
