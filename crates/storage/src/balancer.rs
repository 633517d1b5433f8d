//! Chunk splitting and migration
//!
//! After every bulk insert the router splits chunks that grew past the size
//! threshold at their median key and moves the upper half to the shard
//! owning the fewest chunks. Migration is done under the collection's
//! metadata lock, so readers never see a document on two shards or on none.

use bulkcheck_core::CollectionHandle;
use tracing::{debug, warn};

use crate::chunk::ChunkTable;
use crate::shard::ShardNode;

/// Split oversized chunks until none is left; returns the number of splits.
pub(crate) fn rebalance(
    chunks: &mut ChunkTable,
    shards: &[ShardNode],
    collection: &CollectionHandle,
    max_chunk_bytes: u64,
) -> usize {
    let mut splits = 0;

    while let Some(idx) = chunks
        .chunks()
        .iter()
        .position(|c| c.bytes > max_chunk_bytes && !c.jumbo)
    {
        let chunk = chunks.chunk(idx).clone();
        let donor = &shards[chunk.shard];

        let keys = donor.keys_in_range(collection, chunk.min, chunk.max);
        if keys.len() < 2 {
            warn!(
                collection = %collection,
                min = chunk.min,
                bytes = chunk.bytes,
                "Chunk holds a single key and cannot be split"
            );
            chunks.mark_jumbo(idx);
            continue;
        }

        let at = keys[keys.len() / 2];
        let upper = chunks.split(idx, at);
        splits += 1;

        let counts = chunks.chunk_counts(shards.len());
        let target = counts
            .iter()
            .enumerate()
            .min_by_key(|&(shard, &count)| (count, shard))
            .map(|(shard, _)| shard)
            .unwrap_or(chunk.shard);

        if target != chunk.shard {
            let moved = donor.take_range(collection, at, chunk.max);
            debug!(
                collection = %collection,
                from = chunk.shard,
                to = target,
                split_at = at,
                documents = moved.len(),
                "Migrating chunk"
            );
            shards[target].absorb(collection, moved);
            chunks.assign(upper, target);
        }

        let lower_bytes = donor.bytes_in_range(collection, chunk.min, Some(at));
        let upper_chunk = chunks.chunk(upper).clone();
        let upper_bytes =
            shards[upper_chunk.shard].bytes_in_range(collection, upper_chunk.min, upper_chunk.max);
        chunks.set_bytes(idx, lower_bytes);
        chunks.set_bytes(upper, upper_bytes);
    }

    splits
}
