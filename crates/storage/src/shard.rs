//! Shard node storage
//!
//! Each shard node keeps one [`Shard`] per collection.
//!
//! # Design
//!
//! - DashMap: collections sharded across locks, concurrent readers
//! - FxHashMap: O(1) `_id` lookups, fast non-crypto hash
//! - A sub-batch holds its collection's lock for its whole duration, so a
//!   reader never observes half of a shard's sub-batch
//!
//! Storage-level constraints (unique `_id`, the compound pair index, the
//! unique sentinel index) are enforced here, after the router has accepted
//! the document.

use bulkcheck_core::{
    encoded_len, CollectionHandle, DocId, Document, Predicate, WriteError, WriteErrorCode,
};
use dashmap::DashMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::chunk::ShardId;

/// Secondary indexes defined on a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSet {
    /// `{ a: 1, b: 1 }`
    pub compound_pair: bool,
    /// `{ _sk: 1, marker: 1 }`, unique and sparse
    pub unique_sentinel: bool,
}

/// A persisted document and its serialized size
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// The document as written
    pub doc: Document,
    /// Serialized size in bytes
    pub size: usize,
}

/// One collection's documents on one shard node
#[derive(Debug, Default)]
pub struct Shard {
    /// HashMap with FxHash keyed by `_id`
    pub(crate) data: FxHashMap<DocId, StoredDocument>,
    /// Entries of the unique `(_sk, marker)` index
    unique_sentinel: FxHashSet<(Option<i64>, String)>,
}

impl Shard {
    /// Create a new empty shard
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of documents in this shard
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if shard is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a document by id
    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.data.get(&id).map(|stored| &stored.doc)
    }

    /// Check a document against storage constraints without writing it.
    fn check(&self, doc: &Document, indexes: IndexSet) -> Result<(), (WriteErrorCode, String)> {
        if self.data.contains_key(&doc.id) {
            return Err((
                WriteErrorCode::DuplicateKey,
                format!("duplicate key on _id: {}", doc.id),
            ));
        }
        if indexes.compound_pair && doc.has_parallel_arrays() {
            return Err((
                WriteErrorCode::CannotIndexParallelArrays,
                "cannot index parallel arrays [b] [a]".to_string(),
            ));
        }
        if indexes.unique_sentinel {
            if let Some(marker) = &doc.marker {
                if self
                    .unique_sentinel
                    .contains(&(doc.partition_key, marker.clone()))
                {
                    return Err((
                        WriteErrorCode::DuplicateKey,
                        format!(
                            "duplicate key on {{ _sk: {:?}, marker: {:?} }}",
                            doc.partition_key, marker
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Store a document that passed [`Shard::check`]
    fn put(&mut self, doc: Document) -> usize {
        let size = encoded_len(&doc);
        if let Some(marker) = &doc.marker {
            self.unique_sentinel
                .insert((doc.partition_key, marker.clone()));
        }
        self.data.insert(doc.id, StoredDocument { doc, size });
        size
    }

    fn remove(&mut self, id: DocId) -> Option<StoredDocument> {
        let stored = self.data.remove(&id)?;
        if let Some(marker) = &stored.doc.marker {
            self.unique_sentinel
                .remove(&(stored.doc.partition_key, marker.clone()));
        }
        Some(stored)
    }

    fn count(&self, predicate: &Predicate) -> u64 {
        match predicate {
            Predicate::All => self.data.len() as u64,
            Predicate::IdEquals(id) => u64::from(self.data.contains_key(id)),
            other => self
                .data
                .values()
                .filter(|stored| other.matches(&stored.doc))
                .count() as u64,
        }
    }

    fn ids_in_range(&self, min: i64, max: Option<i64>) -> Vec<DocId> {
        self.data
            .values()
            .filter(|stored| in_range(stored.doc.partition_key, min, max))
            .map(|stored| stored.doc.id)
            .collect()
    }

    fn clear(&mut self) -> u64 {
        let removed = self.data.len() as u64;
        self.data.clear();
        self.unique_sentinel.clear();
        removed
    }
}

fn in_range(key: Option<i64>, min: i64, max: Option<i64>) -> bool {
    match key {
        Some(k) => k >= min && max.map_or(true, |m| k < m),
        None => false,
    }
}

/// Result of applying one sub-batch on a shard
#[derive(Debug, Default)]
pub struct ShardWriteResult {
    /// Partition key and size of each document written
    pub written: Vec<(Option<i64>, usize)>,
    /// Rejected documents, in batch order
    pub errors: Vec<WriteError>,
}

impl ShardWriteResult {
    /// Whether any document was rejected
    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A storage node: per-collection shards in a DashMap
///
/// # Thread Safety
///
/// All operations take `&self`. Writes lock only the target collection's
/// shard; different collections never contend.
pub struct ShardNode {
    id: ShardId,
    collections: DashMap<CollectionHandle, Shard>,
}

impl ShardNode {
    /// Create an empty shard node
    pub fn new(id: ShardId) -> Self {
        Self {
            id,
            collections: DashMap::new(),
        }
    }

    /// Node id
    pub fn id(&self) -> ShardId {
        self.id
    }

    /// Apply a sub-batch in order.
    ///
    /// `docs` pairs each document with its position in the client's batch.
    /// Without `continue_on_error` the node stops at its first rejection.
    pub fn apply(
        &self,
        collection: &CollectionHandle,
        docs: &[(usize, &Document)],
        indexes: IndexSet,
        continue_on_error: bool,
    ) -> ShardWriteResult {
        let mut shard = self.collections.entry(collection.clone()).or_default();
        let mut result = ShardWriteResult::default();

        for &(index, doc) in docs {
            match shard.check(doc, indexes) {
                Ok(()) => {
                    let size = shard.put(doc.clone());
                    result.written.push((doc.partition_key, size));
                }
                Err((code, message)) => {
                    debug!(
                        shard = self.id,
                        collection = %collection,
                        index,
                        id = doc.id,
                        code = %code,
                        "Shard rejected document"
                    );
                    result.errors.push(WriteError {
                        index,
                        id: doc.id,
                        code,
                        message,
                    });
                    if !continue_on_error {
                        break;
                    }
                }
            }
        }

        result
    }

    /// Count documents matching `predicate`
    pub fn count(&self, collection: &CollectionHandle, predicate: &Predicate) -> u64 {
        self.collections
            .get(collection)
            .map(|shard| shard.count(predicate))
            .unwrap_or(0)
    }

    /// Get a document by id
    pub fn get(&self, collection: &CollectionHandle, id: DocId) -> Option<Document> {
        self.collections
            .get(collection)
            .and_then(|shard| shard.get(id).cloned())
    }

    /// Number of documents in `collection` on this node
    pub fn len(&self, collection: &CollectionHandle) -> usize {
        self.collections
            .get(collection)
            .map(|shard| shard.len())
            .unwrap_or(0)
    }

    /// Get total number of documents across all collections
    pub fn total_entries(&self) -> usize {
        self.collections.iter().map(|entry| entry.value().len()).sum()
    }

    /// Remove every document of `collection`; returns the count removed
    pub fn clear(&self, collection: &CollectionHandle) -> u64 {
        self.collections
            .get_mut(collection)
            .map(|mut shard| shard.clear())
            .unwrap_or(0)
    }

    /// Distinct partition keys stored in `[min, max)`
    pub fn keys_in_range(&self, collection: &CollectionHandle, min: i64, max: Option<i64>) -> Vec<i64> {
        let Some(shard) = self.collections.get(collection) else {
            return Vec::new();
        };
        let mut keys: Vec<i64> = shard
            .data
            .values()
            .filter_map(|stored| stored.doc.partition_key)
            .filter(|&k| in_range(Some(k), min, max))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// Serialized bytes stored in `[min, max)`
    pub fn bytes_in_range(&self, collection: &CollectionHandle, min: i64, max: Option<i64>) -> u64 {
        self.collections
            .get(collection)
            .map(|shard| {
                shard
                    .data
                    .values()
                    .filter(|stored| in_range(stored.doc.partition_key, min, max))
                    .map(|stored| stored.size as u64)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Remove and return every document in `[min, max)`
    pub fn take_range(&self, collection: &CollectionHandle, min: i64, max: Option<i64>) -> Vec<Document> {
        let Some(mut shard) = self.collections.get_mut(collection) else {
            return Vec::new();
        };
        let ids = shard.ids_in_range(min, max);
        ids.into_iter()
            .filter_map(|id| shard.remove(id))
            .map(|stored| stored.doc)
            .collect()
    }

    /// Store migrated documents; they already passed constraint checks on
    /// their donor shard.
    pub fn absorb(&self, collection: &CollectionHandle, docs: Vec<Document>) {
        let mut shard = self.collections.entry(collection.clone()).or_default();
        for doc in docs {
            shard.put(doc);
        }
    }
}

impl std::fmt::Debug for ShardNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardNode")
            .field("id", &self.id)
            .field("collections", &self.collections.len())
            .field("total_entries", &self.total_entries())
            .finish()
    }
}
