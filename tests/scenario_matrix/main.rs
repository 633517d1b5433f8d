//! Scenario Matrix Test Suite
//!
//! End-to-end checks of the harness against the in-memory cluster and
//! against stores that misbehave on purpose.
//!
//! ## Test Groups
//!
//! - **Concrete**: hand-built batches with known expected presence
//! - **Matrix**: full scenario runs, seeds and cluster shapes
//! - **Faulty stores**: stores that break an invariant must be caught
//! - **Properties**: random batches and faults against the cluster
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test scenario_matrix
//! ```

mod test_utils;

mod concrete_vectors;
mod faulty_stores;
mod full_matrix;
mod properties;
