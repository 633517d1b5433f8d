//! Range-partitioned chunk table
//!
//! Chunks cover the whole `i64` key space with no gaps: the first chunk starts
//! at `i64::MIN`, the last one is unbounded above, and each chunk's `max` is
//! the next chunk's `min`.

/// Index of a shard node in the cluster
pub type ShardId = usize;

/// Initial split points are spread over `[0, KEY_SPACE)`, the range the
/// scrambled partition keys occupy.
pub const KEY_SPACE: i64 = 1 << 24;

/// A contiguous range of partition keys owned by one shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Lower bound (inclusive)
    pub min: i64,
    /// Upper bound (exclusive); `None` is unbounded
    pub max: Option<i64>,
    /// Owning shard
    pub shard: ShardId,
    /// Serialized bytes currently stored in the range
    pub bytes: u64,
    /// Holds a single key and cannot be split further
    pub jumbo: bool,
}

impl Chunk {
    /// Whether `key` falls in this chunk
    pub fn contains(&self, key: i64) -> bool {
        key >= self.min && self.max.map_or(true, |max| key < max)
    }
}

/// Ordered chunk list for one partitioned collection.
#[derive(Debug, Clone)]
pub struct ChunkTable {
    chunks: Vec<Chunk>,
}

impl ChunkTable {
    /// Create `shards * per_shard` chunks with evenly spaced split points,
    /// assigned to shards round-robin.
    pub fn initial(shards: usize, per_shard: usize) -> Self {
        let total = (shards * per_shard).max(1);
        let step = KEY_SPACE / total as i64;

        let chunks = (0..total)
            .map(|i| Chunk {
                min: if i == 0 { i64::MIN } else { step * i as i64 },
                max: if i + 1 == total {
                    None
                } else {
                    Some(step * (i as i64 + 1))
                },
                shard: i % shards.max(1),
                bytes: 0,
                jumbo: false,
            })
            .collect();

        Self { chunks }
    }

    /// All chunks in key order
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Number of chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Always false; a table covers the key space with at least one chunk
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk at `idx`
    pub fn chunk(&self, idx: usize) -> &Chunk {
        &self.chunks[idx]
    }

    /// Index of the chunk containing `key`
    pub fn route(&self, key: i64) -> usize {
        self.chunks.partition_point(|c| c.min <= key) - 1
    }

    /// Shard owning `key`
    pub fn shard_for(&self, key: i64) -> ShardId {
        self.chunks[self.route(key)].shard
    }

    /// Account `bytes` written under `key`
    pub fn record_write(&mut self, key: i64, bytes: u64) {
        let idx = self.route(key);
        self.chunks[idx].bytes += bytes;
    }

    /// Split chunk `idx` at `at`; the new upper chunk is returned by index.
    ///
    /// `at` must lie strictly inside the chunk. Both halves stay on the
    /// original shard with zero bytes; the caller recomputes sizes.
    pub fn split(&mut self, idx: usize, at: i64) -> usize {
        let chunk = &mut self.chunks[idx];
        debug_assert!(chunk.min < at && chunk.contains(at));

        let upper = Chunk {
            min: at,
            max: chunk.max,
            shard: chunk.shard,
            bytes: 0,
            jumbo: false,
        };
        chunk.max = Some(at);
        chunk.bytes = 0;

        self.chunks.insert(idx + 1, upper);
        idx + 1
    }

    /// Reassign chunk `idx` to `shard`
    pub fn assign(&mut self, idx: usize, shard: ShardId) {
        self.chunks[idx].shard = shard;
    }

    /// Overwrite the byte count of chunk `idx`
    pub fn set_bytes(&mut self, idx: usize, bytes: u64) {
        self.chunks[idx].bytes = bytes;
    }

    /// Mark chunk `idx` as unsplittable
    pub fn mark_jumbo(&mut self, idx: usize) {
        self.chunks[idx].jumbo = true;
    }

    /// Zero every byte count (after the collection is emptied)
    pub fn reset_sizes(&mut self) {
        for chunk in &mut self.chunks {
            chunk.bytes = 0;
            chunk.jumbo = false;
        }
    }

    /// Chunks owned by each shard
    pub fn chunk_counts(&self, shards: usize) -> Vec<usize> {
        let mut counts = vec![0; shards];
        for chunk in &self.chunks {
            counts[chunk.shard] += 1;
        }
        counts
    }
}
