//! Bulk-insert fault-tolerance harness
//!
//! Generates size-targeted batches, corrupts chosen documents so the router
//! or a storage node rejects them, submits each batch in one bulk insert and
//! checks persisted state against the error mode:
//! - batch: batch generation and partition-key scrambling
//! - inject: fault position selection and document corruption
//! - driver: bulk submission with a count-delta diagnostic
//! - verify: presence and sentinel invariants
//! - scenario: the 32-scenario matrix and the harness loop
//! - report: per-trial, per-scenario and per-run counters

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod driver;
pub mod inject;
pub mod report;
pub mod scenario;
pub mod verify;

pub use batch::{generate_batch, scramble_key, Batch, BatchSpec};
pub use driver::{submit, Submission};
pub use inject::{choose_positions, corrupt, inject_faults, FaultPlan, FaultTemplate, Positions};
pub use report::{RunReport, ScenarioReport, TrialReport};
pub use scenario::{scenario_matrix, Harness, ScenarioFilter, FIRST_BATCH_ID};
pub use verify::{expected_presence, verify_batch, verify_sentinel, BatchVerification};
