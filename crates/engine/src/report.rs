//! Run reports
//!
//! Counters gathered while running scenarios. Reports serialize to JSON for
//! the CLI's machine-readable output.

use bulkcheck_core::ScenarioOptions;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Counters for one trial
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrialReport {
    /// Documents in the batch
    pub documents: u64,
    /// Serialized batch size in bytes
    pub bytes: u64,
    /// Faults injected
    pub faults: u64,
    /// Documents verified present
    pub present: u64,
    /// Documents verified absent
    pub absent: u64,
    /// Count the store reported as inserted
    pub reported_inserted: u64,
    /// Rejections the store reported
    pub reported_errors: u64,
}

/// Aggregate for one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    /// Scenario options
    pub options: ScenarioOptions,
    /// Trials completed
    pub trials: u64,
    /// Sum of trial counters
    pub totals: TrialReport,
    /// Wall time in milliseconds
    pub elapsed_ms: u64,
}

impl ScenarioReport {
    /// Empty report for `options`
    pub fn new(options: ScenarioOptions) -> Self {
        Self {
            options,
            trials: 0,
            totals: TrialReport::default(),
            elapsed_ms: 0,
        }
    }

    /// Add one trial
    pub fn record(&mut self, trial: &TrialReport) {
        self.trials += 1;
        let t = &mut self.totals;
        t.documents += trial.documents;
        t.bytes += trial.bytes;
        t.faults += trial.faults;
        t.present += trial.present;
        t.absent += trial.absent;
        t.reported_inserted += trial.reported_inserted;
        t.reported_errors += trial.reported_errors;
    }
}

/// Result of a full run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Unique id of this run
    pub run_id: Uuid,
    /// RNG seed; rerun with it to reproduce
    pub seed: u64,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Completed scenarios, in run order
    pub scenarios: Vec<ScenarioReport>,
    /// Wall time in milliseconds
    pub elapsed_ms: u64,
}

impl RunReport {
    /// Empty report starting now
    pub fn new(seed: u64) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            seed,
            started_at: Utc::now(),
            scenarios: Vec::new(),
            elapsed_ms: 0,
        }
    }

    /// Total trials over all scenarios
    pub fn trials(&self) -> u64 {
        self.scenarios.iter().map(|s| s.trials).sum()
    }

    /// Total documents submitted
    pub fn documents(&self) -> u64 {
        self.scenarios.iter().map(|s| s.totals.documents).sum()
    }

    /// Total faults injected
    pub fn faults(&self) -> u64 {
        self.scenarios.iter().map(|s| s.totals.faults).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkcheck_core::FaultLocation;

    fn options() -> ScenarioOptions {
        ScenarioOptions {
            continue_on_error: true,
            fault_location: FaultLocation::Router,
            force_first_fault: false,
            force_last_fault: true,
            scramble_partition_key: false,
        }
    }

    #[test]
    fn test_scenario_totals() {
        let mut report = ScenarioReport::new(options());
        let trial = TrialReport {
            documents: 10,
            bytes: 1000,
            faults: 2,
            present: 8,
            absent: 2,
            reported_inserted: 8,
            reported_errors: 2,
        };
        report.record(&trial);
        report.record(&trial);
        assert_eq!(report.trials, 2);
        assert_eq!(report.totals.documents, 20);
        assert_eq!(report.totals.absent, 4);
    }

    #[test]
    fn test_run_totals_and_json() {
        let mut run = RunReport::new(42);
        let mut scenario = ScenarioReport::new(options());
        scenario.record(&TrialReport {
            documents: 3,
            faults: 1,
            ..TrialReport::default()
        });
        run.scenarios.push(scenario.clone());
        run.scenarios.push(scenario);

        assert_eq!(run.trials(), 2);
        assert_eq!(run.documents(), 6);
        assert_eq!(run.faults(), 2);

        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["seed"], 42);
        assert_eq!(json["scenarios"][0]["options"]["fault_location"], "router");
        assert_eq!(json["scenarios"][1]["totals"]["documents"], 3);
    }
}
