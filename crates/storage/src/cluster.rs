//! In-memory sharded cluster
//!
//! A router in front of N shard nodes. The router owns per-collection
//! metadata (chunk table and index definitions), rejects documents it cannot
//! place, and dispatches the rest to shard nodes:
//!
//! - stop-on-error: consecutive documents bound for the same shard are sent
//!   as one sub-batch, in batch order; the first rejection (router or shard)
//!   ends the write
//! - continue-on-error: every routable document is grouped by shard and the
//!   groups are applied in parallel
//!
//! The outcome carries the inserted count and one representative error, the
//! way a partitioned write reports back to a client.

use std::slice;

use bulkcheck_core::encoding::PARTITION_KEY_FIELD;
use bulkcheck_core::{
    encoded_len, ClusterConfig, CollectionHandle, DatasetLifecycle, DocId, Document,
    DocumentReader, DocumentWriter, IndexSpec, InsertOptions, InsertOutcome, Predicate,
    StoreError, StoreResult, WriteError, WriteErrorCode, MAX_DOCUMENT_SIZE,
};
use dashmap::{DashMap, DashSet};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::balancer;
use crate::chunk::{ChunkTable, ShardId};
use crate::shard::{IndexSet, ShardNode, ShardWriteResult};

/// Shard holding unsharded collections
pub const PRIMARY_SHARD: ShardId = 0;

#[derive(Debug, Default)]
struct CollectionMeta {
    /// `None` until the collection is partitioned
    chunks: Option<ChunkTable>,
    indexes: IndexSet,
}

/// Router plus shard nodes.
///
/// # Example
///
/// ```ignore
/// let cluster = Cluster::new(ClusterConfig::default())?;
/// let coll = CollectionHandle::new("testDatabase", "testCollection");
/// cluster.enable_sharding("testDatabase")?;
/// cluster.define_partition_key(&coll, "_sk")?;
/// let outcome = cluster.insert(&coll, &batch, InsertOptions::new(true))?;
/// ```
pub struct Cluster {
    config: ClusterConfig,
    shards: Vec<ShardNode>,
    sharded_databases: DashSet<String>,
    collections: DashMap<CollectionHandle, CollectionMeta>,
}

impl Cluster {
    /// Create a cluster with `config.shards` empty shard nodes
    pub fn new(config: ClusterConfig) -> StoreResult<Self> {
        if config.shards == 0 {
            return Err(StoreError::NoShards);
        }
        let shards = (0..config.shards).map(ShardNode::new).collect();
        Ok(Self {
            config,
            shards,
            sharded_databases: DashSet::new(),
            collections: DashMap::new(),
        })
    }

    /// Cluster configuration
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Number of shard nodes
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Shard node by id
    pub fn shard(&self, id: ShardId) -> Option<&ShardNode> {
        self.shards.get(id)
    }

    /// Whether `collection` has a partition key
    pub fn is_sharded(&self, collection: &CollectionHandle) -> bool {
        self.collections
            .get(collection)
            .map_or(false, |meta| meta.chunks.is_some())
    }

    /// Number of chunks of a partitioned collection
    pub fn chunk_count(&self, collection: &CollectionHandle) -> Option<usize> {
        self.collections
            .get(collection)
            .and_then(|meta| meta.chunks.as_ref().map(ChunkTable::len))
    }

    /// Documents of `collection` on each shard node
    pub fn distribution(&self, collection: &CollectionHandle) -> Vec<usize> {
        self.shards.iter().map(|s| s.len(collection)).collect()
    }

    /// Fetch a document by id from whichever shard holds it
    pub fn find_by_id(&self, collection: &CollectionHandle, id: DocId) -> Option<Document> {
        self.shards.iter().find_map(|s| s.get(collection, id))
    }

    /// Decide where a document goes, or why the router refuses it.
    fn route(
        chunks: Option<&ChunkTable>,
        index: usize,
        doc: &Document,
    ) -> Result<ShardId, WriteError> {
        let size = encoded_len(doc);
        if size > MAX_DOCUMENT_SIZE {
            return Err(WriteError {
                index,
                id: doc.id,
                code: WriteErrorCode::DocumentTooLarge,
                message: format!("document is {} bytes, limit {}", size, MAX_DOCUMENT_SIZE),
            });
        }

        match (chunks, doc.partition_key) {
            (None, _) => Ok(PRIMARY_SHARD),
            (Some(table), Some(key)) => Ok(table.shard_for(key)),
            (Some(_), None) => Err(WriteError {
                index,
                id: doc.id,
                code: WriteErrorCode::MissingPartitionKey,
                message: format!("document has no partition key ({})", PARTITION_KEY_FIELD),
            }),
        }
    }

    fn dispatch_ordered(
        &self,
        collection: &CollectionHandle,
        batch: &[Document],
        plan: &[Result<ShardId, WriteError>],
        indexes: IndexSet,
    ) -> (Vec<ShardWriteResult>, Vec<WriteError>) {
        let mut results = Vec::new();
        let mut run: Vec<(usize, &Document)> = Vec::new();
        let mut run_shard = PRIMARY_SHARD;

        for (index, (doc, target)) in batch.iter().zip(plan).enumerate() {
            match target {
                Ok(shard) => {
                    if *shard != run_shard && !run.is_empty() {
                        let result = self.shards[run_shard].apply(collection, &run, indexes, false);
                        let failed = result.failed();
                        results.push(result);
                        run.clear();
                        if failed {
                            return (results, Vec::new());
                        }
                    }
                    run_shard = *shard;
                    run.push((index, doc));
                }
                Err(err) => {
                    if !run.is_empty() {
                        let result = self.shards[run_shard].apply(collection, &run, indexes, false);
                        let failed = result.failed();
                        results.push(result);
                        if failed {
                            return (results, Vec::new());
                        }
                    }
                    return (results, vec![err.clone()]);
                }
            }
        }

        if !run.is_empty() {
            results.push(self.shards[run_shard].apply(collection, &run, indexes, false));
        }
        (results, Vec::new())
    }

    fn dispatch_parallel(
        &self,
        collection: &CollectionHandle,
        batch: &[Document],
        plan: &[Result<ShardId, WriteError>],
        indexes: IndexSet,
    ) -> (Vec<ShardWriteResult>, Vec<WriteError>) {
        let mut groups: Vec<Vec<(usize, &Document)>> = vec![Vec::new(); self.shards.len()];
        let mut router_errors = Vec::new();

        for (index, (doc, target)) in batch.iter().zip(plan).enumerate() {
            match target {
                Ok(shard) => groups[*shard].push((index, doc)),
                Err(err) => router_errors.push(err.clone()),
            }
        }

        let results: Vec<ShardWriteResult> = groups
            .into_par_iter()
            .enumerate()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(shard, docs)| self.shards[shard].apply(collection, &docs, indexes, true))
            .collect();

        (results, router_errors)
    }
}

impl DocumentWriter for Cluster {
    fn insert(
        &self,
        collection: &CollectionHandle,
        batch: &[Document],
        options: InsertOptions,
    ) -> StoreResult<InsertOutcome> {
        let mut meta = self.collections.entry(collection.clone()).or_default();
        let indexes = meta.indexes;

        let plan: Vec<Result<ShardId, WriteError>> = batch
            .iter()
            .enumerate()
            .map(|(index, doc)| Self::route(meta.chunks.as_ref(), index, doc))
            .collect();

        let (results, router_errors) = if options.continue_on_error {
            self.dispatch_parallel(collection, batch, &plan, indexes)
        } else {
            self.dispatch_ordered(collection, batch, &plan, indexes)
        };

        let mut outcome = InsertOutcome::default();
        let mut errors = router_errors;
        for result in results {
            outcome.inserted += result.written.len() as u64;
            if let Some(chunks) = meta.chunks.as_mut() {
                for (key, size) in &result.written {
                    if let Some(key) = key {
                        chunks.record_write(*key, *size as u64);
                    }
                }
            }
            errors.extend(result.errors);
        }

        errors.sort_by_key(|e| e.index);
        outcome.error_count = errors.len() as u64;
        outcome.last_error = errors.pop();

        if let Some(chunks) = meta.chunks.as_mut() {
            let splits =
                balancer::rebalance(chunks, &self.shards, collection, self.config.max_chunk_bytes);
            if splits > 0 {
                debug!(collection = %collection, splits, chunks = chunks.len(), "Rebalanced chunks");
            }
        }

        debug!(
            collection = %collection,
            batch = batch.len(),
            inserted = outcome.inserted,
            errors = outcome.error_count,
            continue_on_error = options.continue_on_error,
            "Bulk insert complete"
        );

        Ok(outcome)
    }
}

impl DocumentReader for Cluster {
    fn count(&self, collection: &CollectionHandle, predicate: &Predicate) -> StoreResult<u64> {
        // Waits out any insert or migration in progress on this collection
        let _meta = self.collections.get(collection);
        Ok(self.shards.iter().map(|s| s.count(collection, predicate)).sum())
    }
}

impl DatasetLifecycle for Cluster {
    fn enable_sharding(&self, database: &str) -> StoreResult<()> {
        if self.sharded_databases.insert(database.to_string()) {
            info!(database, "Enabled sharding");
        }
        Ok(())
    }

    fn define_partition_key(&self, collection: &CollectionHandle, field: &str) -> StoreResult<()> {
        if field != PARTITION_KEY_FIELD {
            return Err(StoreError::UnsupportedPartitionKey(field.to_string()));
        }
        if !self.sharded_databases.contains(&collection.database) {
            return Err(StoreError::ShardingNotEnabled(collection.database.clone()));
        }

        let mut meta = self.collections.entry(collection.clone()).or_default();
        if meta.chunks.is_some() {
            return Err(StoreError::AlreadySharded(collection.full_name()));
        }
        let count: u64 = self.shards.iter().map(|s| s.len(collection) as u64).sum();
        if count > 0 {
            return Err(StoreError::NotEmpty {
                collection: collection.full_name(),
                count,
            });
        }

        let table = ChunkTable::initial(self.shards.len(), self.config.initial_chunks_per_shard);
        info!(
            collection = %collection,
            key = field,
            chunks = table.len(),
            shards = self.shards.len(),
            "Sharded collection"
        );
        meta.chunks = Some(table);
        Ok(())
    }

    fn ensure_index(&self, collection: &CollectionHandle, index: IndexSpec) -> StoreResult<()> {
        let mut meta = self.collections.entry(collection.clone()).or_default();
        match index {
            IndexSpec::CompoundPair => meta.indexes.compound_pair = true,
            IndexSpec::UniqueSentinel => meta.indexes.unique_sentinel = true,
        }
        debug!(collection = %collection, index = ?index, "Ensured index");
        Ok(())
    }

    fn remove_all(&self, collection: &CollectionHandle) -> StoreResult<u64> {
        let mut meta = self.collections.entry(collection.clone()).or_default();
        let removed: u64 = self.shards.iter().map(|s| s.clear(collection)).sum();
        if let Some(chunks) = meta.chunks.as_mut() {
            chunks.reset_sizes();
        }
        debug!(collection = %collection, removed, "Removed all documents");
        Ok(removed)
    }

    fn insert_one(&self, collection: &CollectionHandle, document: Document) -> StoreResult<()> {
        let outcome = self.insert(
            collection,
            slice::from_ref(&document),
            InsertOptions::default(),
        )?;
        match outcome.last_error {
            Some(err) => Err(StoreError::Rejected(err)),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("shards", &self.shards.len())
            .field("collections", &self.collections.len())
            .field("max_chunk_bytes", &self.config.max_chunk_bytes)
            .finish()
    }
}
