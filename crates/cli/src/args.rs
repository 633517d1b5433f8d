//! Command-line arguments
//!
//! Flags override the matching settings of the config file, which in turn
//! override the built-in defaults.

use std::path::PathBuf;

use bulkcheck_core::{
    ConfigError, FaultLocation, HarnessConfig, InclusiveRange, StorageFaultMechanism,
};
use bulkcheck_engine::ScenarioFilter;
use clap::{Parser, ValueEnum};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "bulkcheck")]
#[command(about = "Bulk-insert fault-tolerance checks against a sharded document store", version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Trials per scenario [default: 100]
    #[arg(short, long)]
    pub iterations: Option<u64>,

    /// Minimum batch target size in bytes [default: 1000]
    #[arg(long)]
    pub batch_min: Option<u64>,

    /// Maximum batch target size in bytes [default: 1000000]
    #[arg(long)]
    pub batch_max: Option<u64>,

    /// Minimum document size in bytes [default: 1000]
    #[arg(long)]
    pub doc_min: Option<u64>,

    /// Maximum document size in bytes [default: 20000]
    #[arg(long)]
    pub doc_max: Option<u64>,

    /// Minimum faults per batch [default: 0]
    #[arg(long)]
    pub faults_min: Option<u64>,

    /// Maximum faults per batch [default: 10]
    #[arg(long)]
    pub faults_max: Option<u64>,

    /// RNG seed; printed on every run so failures can be replayed
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Storage fault mechanism (parallel-arrays, duplicate-sentinel)
    #[arg(long)]
    pub storage_fault: Option<StorageFaultMechanism>,

    /// Shard nodes in the in-memory cluster [default: 2]
    #[arg(long)]
    pub shards: Option<usize>,

    /// Chunk split threshold in bytes [default: 1048576]
    #[arg(long)]
    pub chunk_bytes: Option<u64>,

    /// Do not seed the sentinel document
    #[arg(long)]
    pub no_sentinel: bool,

    /// Only run scenarios with this error mode
    #[arg(long)]
    pub continue_on_error: Option<bool>,

    /// Only run scenarios with this fault location (router, storage)
    #[arg(long)]
    pub location: Option<FaultLocation>,

    /// Only run scenarios with this force-first setting
    #[arg(long)]
    pub force_first: Option<bool>,

    /// Only run scenarios with this force-last setting
    #[arg(long)]
    pub force_last: Option<bool>,

    /// Only run scenarios with this key scrambling setting
    #[arg(long)]
    pub scramble: Option<bool>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

fn override_range(range: &mut InclusiveRange, min: Option<u64>, max: Option<u64>) {
    if let Some(min) = min {
        range.min = min;
    }
    if let Some(max) = max {
        range.max = max;
    }
}

impl Cli {
    /// Defaults, then the config file, then flags
    pub fn harness_config(&self) -> Result<HarnessConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::from_file(path)?,
            None => HarnessConfig::default(),
        };

        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        override_range(&mut config.batch_sizes, self.batch_min, self.batch_max);
        override_range(&mut config.document_sizes, self.doc_min, self.doc_max);
        override_range(&mut config.fault_counts, self.faults_min, self.faults_max);

        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(mechanism) = self.storage_fault {
            config.storage_fault = mechanism;
        }
        if self.no_sentinel {
            config.seed_sentinel = false;
        }

        let cluster = &mut config.cluster;
        if let Some(shards) = self.shards {
            cluster.shards = shards;
        }
        if let Some(bytes) = self.chunk_bytes {
            cluster.max_chunk_bytes = bytes;
        }

        Ok(config)
    }

    /// Scenario filter from the filter flags
    pub fn filter(&self) -> ScenarioFilter {
        ScenarioFilter {
            continue_on_error: self.continue_on_error,
            fault_location: self.location,
            force_first_fault: self.force_first,
            force_last_fault: self.force_last,
            scramble_partition_key: self.scramble,
        }
    }
}
