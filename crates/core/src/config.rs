//! Harness and cluster configuration.
//!
//! Both records deserialize from TOML with every field optional:
//!
//! ```toml
//! iterations = 10
//! seed = 42
//! storage_fault = "duplicate-sentinel"
//!
//! [batch_sizes]
//! min = 1
//! max = 1000000
//!
//! [cluster]
//! shards = 2
//! ```
//!
//! Use the builder methods to override individual settings:
//!
//! ```ignore
//! let config = HarnessConfig::new().iterations(10).seed(7);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::encoding::MAX_DOCUMENT_SIZE;
use crate::error::ConfigError;
use crate::options::{InclusiveRange, StorageFaultMechanism};

/// Configuration of the in-memory sharded cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Number of shard nodes
    pub shards: usize,
    /// Chunks larger than this are split and rebalanced
    pub max_chunk_bytes: u64,
    /// Chunks per shard created when a collection is partitioned
    pub initial_chunks_per_shard: usize,
}

impl ClusterConfig {
    /// Default cluster configuration (2 shards, 1 MiB chunks)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shard count
    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Set the chunk split threshold
    pub fn max_chunk_bytes(mut self, bytes: u64) -> Self {
        self.max_chunk_bytes = bytes;
        self
    }

    /// Set the initial chunk count per shard
    pub fn initial_chunks_per_shard(mut self, chunks: usize) -> Self {
        self.initial_chunks_per_shard = chunks;
        self
    }

    /// Check the cluster can be built
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shards == 0 {
            return Err(ConfigError::Invalid("cluster.shards must be at least 1".into()));
        }
        if self.initial_chunks_per_shard == 0 {
            return Err(ConfigError::Invalid(
                "cluster.initial_chunks_per_shard must be at least 1".into(),
            ));
        }
        if self.max_chunk_bytes == 0 {
            return Err(ConfigError::Invalid(
                "cluster.max_chunk_bytes must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            shards: 2,
            max_chunk_bytes: 1024 * 1024,
            initial_chunks_per_shard: 1,
        }
    }
}

/// Configuration of a harness run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Trials per scenario
    pub iterations: u64,
    /// Target aggregate serialized size per batch, in bytes
    pub batch_sizes: InclusiveRange,
    /// Serialized size per document, in bytes
    pub document_sizes: InclusiveRange,
    /// Faults injected per batch
    pub fault_counts: InclusiveRange,
    /// How storage faults are manufactured
    pub storage_fault: StorageFaultMechanism,
    /// Reinsert the sentinel after every reset
    pub seed_sentinel: bool,
    /// RNG seed; a random seed is drawn and reported when absent
    pub seed: Option<u64>,
    /// Database holding the test collection
    pub database: String,
    /// Test collection name
    pub collection: String,
    /// In-memory cluster settings
    pub cluster: ClusterConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            batch_sizes: InclusiveRange::new(1_000, 1_000_000),
            document_sizes: InclusiveRange::new(1_000, 20_000),
            fault_counts: InclusiveRange::new(0, 10),
            storage_fault: StorageFaultMechanism::default(),
            seed_sentinel: true,
            seed: None,
            database: "testDatabase".to_string(),
            collection: "testCollection".to_string(),
            cluster: ClusterConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Set trials per scenario
    pub fn iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the batch target size range
    pub fn batch_sizes(mut self, min: u64, max: u64) -> Self {
        self.batch_sizes = InclusiveRange::new(min, max);
        self
    }

    /// Set the document size range
    pub fn document_sizes(mut self, min: u64, max: u64) -> Self {
        self.document_sizes = InclusiveRange::new(min, max);
        self
    }

    /// Set the fault count range
    pub fn fault_counts(mut self, min: u64, max: u64) -> Self {
        self.fault_counts = InclusiveRange::new(min, max);
        self
    }

    /// Set the storage fault mechanism
    pub fn storage_fault(mut self, mechanism: StorageFaultMechanism) -> Self {
        self.storage_fault = mechanism;
        self
    }

    /// Enable or disable sentinel seeding
    pub fn seed_sentinel(mut self, enabled: bool) -> Self {
        self.seed_sentinel = enabled;
        self
    }

    /// Fix the RNG seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the cluster configuration
    pub fn cluster(mut self, cluster: ClusterConfig) -> Self {
        self.cluster = cluster;
        self
    }

    /// Check the configuration is consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.batch_sizes.validate("batch_sizes")?;
        self.document_sizes.validate("document_sizes")?;
        self.fault_counts.validate("fault_counts")?;

        if self.document_sizes.max > MAX_DOCUMENT_SIZE as u64 {
            return Err(ConfigError::Invalid(format!(
                "document_sizes.max {} exceeds the maximum document size {}",
                self.document_sizes.max, MAX_DOCUMENT_SIZE
            )));
        }
        if self.storage_fault == StorageFaultMechanism::DuplicateSentinel && !self.seed_sentinel {
            return Err(ConfigError::Invalid(
                "storage_fault 'duplicate-sentinel' requires seed_sentinel".into(),
            ));
        }
        if self.database.is_empty() || self.collection.is_empty() {
            return Err(ConfigError::Invalid(
                "database and collection names must not be empty".into(),
            ));
        }

        self.cluster.validate()
    }
}
