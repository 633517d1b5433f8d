//! In-memory sharded document cluster
//!
//! A stand-in for a partitioned document store, implementing the store
//! traits from `bulkcheck-core`:
//! - Router: partition-key routing over a range chunk table, router-side rejections
//! - Shard nodes: per-collection document maps with index constraints
//! - Balancer: chunk splits and migrations as collections grow

#![warn(missing_docs)]
#![warn(clippy::all)]

mod balancer;
pub mod chunk;
pub mod cluster;
pub mod shard;

pub use chunk::{Chunk, ChunkTable, ShardId, KEY_SPACE};
pub use cluster::{Cluster, PRIMARY_SHARD};
pub use shard::{IndexSet, ShardNode};
