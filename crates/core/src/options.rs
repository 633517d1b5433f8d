//! Scenario dimensions
//!
//! [`ScenarioOptions`] is one point in the cross product of write policy and
//! fault shape. It is built once per scenario and never changes while that
//! scenario's trials run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Layer at which an injected fault is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultLocation {
    /// Router rejects the document before it reaches any shard
    Router,
    /// A shard accepts the write and rejects it at commit time
    Storage,
}

impl FaultLocation {
    /// Both locations, router first
    pub const ALL: [FaultLocation; 2] = [FaultLocation::Router, FaultLocation::Storage];

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultLocation::Router => "router",
            FaultLocation::Storage => "storage",
        }
    }
}

impl fmt::Display for FaultLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaultLocation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "router" => Ok(FaultLocation::Router),
            "storage" => Ok(FaultLocation::Storage),
            _ => Err(ConfigError::UnknownFaultLocation(s.to_string())),
        }
    }
}

/// How a storage fault is manufactured.
///
/// Both produce a document the router forwards and a shard rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageFaultMechanism {
    /// Arrays in both fields of the compound index
    #[default]
    ParallelArrays,
    /// Copy of the sentinel's `(partition key, marker)` pair under the unique index
    DuplicateSentinel,
}

impl StorageFaultMechanism {
    /// Kebab-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageFaultMechanism::ParallelArrays => "parallel-arrays",
            StorageFaultMechanism::DuplicateSentinel => "duplicate-sentinel",
        }
    }
}

impl fmt::Display for StorageFaultMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageFaultMechanism {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "parallel-arrays" => Ok(StorageFaultMechanism::ParallelArrays),
            "duplicate-sentinel" => Ok(StorageFaultMechanism::DuplicateSentinel),
            _ => Err(ConfigError::UnknownStorageFault(s.to_string())),
        }
    }
}

/// Inclusive `min..=max` range used for sizes and counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusiveRange {
    /// Lower bound (inclusive)
    pub min: u64,
    /// Upper bound (inclusive)
    pub max: u64,
}

impl InclusiveRange {
    /// Create a range
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies in the range
    pub fn contains(&self, value: u64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Reject inverted ranges
    pub fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::InvalidRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl fmt::Display for InclusiveRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// One point in the scenario matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScenarioOptions {
    /// Keep writing later documents after a rejection
    pub continue_on_error: bool,
    /// Layer that rejects injected faults
    pub fault_location: FaultLocation,
    /// Always fault position 0
    pub force_first_fault: bool,
    /// Always fault the last position
    pub force_last_fault: bool,
    /// Decorrelate insertion order from partition-key order
    pub scramble_partition_key: bool,
}

impl fmt::Display for ScenarioOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "continue_on_error={} location={} force_first={} force_last={} scramble={}",
            self.continue_on_error,
            self.fault_location,
            self.force_first_fault,
            self.force_last_fault,
            self.scramble_partition_key
        )
    }
}
