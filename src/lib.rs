//! bulkcheck: partial-failure verification for bulk inserts
//!
//! Writes size-targeted batches with injected faults into a partitioned
//! document store and checks that exactly the right documents persisted
//! under both stop-on-error and continue-on-error semantics.
//!
//! ```ignore
//! use bulkcheck::{Cluster, Harness, HarnessConfig, ScenarioFilter};
//!
//! let config = HarnessConfig::new().iterations(10).seed(42);
//! let cluster = Cluster::new(config.cluster.clone())?;
//! let report = Harness::new(&cluster, config)?.run(&ScenarioFilter::all())?;
//! println!("{} trials passed", report.trials());
//! ```

#![warn(missing_docs)]

mod types;

pub use types::*;
