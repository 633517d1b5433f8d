//! Scenario orchestration
//!
//! Runs the cross product of the five scenario dimensions against a store.
//! Each scenario starts from an empty collection (plus the sentinel) and runs
//! `iterations` trials of generate, inject, submit, verify. The first
//! violation ends the run.

use std::time::Instant;

use bulkcheck_core::encoding::PARTITION_KEY_FIELD;
use bulkcheck_core::{
    CollectionHandle, DocId, Document, FaultLocation, HarnessConfig, HarnessError, IndexSpec,
    Result, ScenarioOptions, Store,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info};

use crate::batch::{generate_batch, BatchSpec};
use crate::driver::submit;
use crate::inject::{inject_faults, FaultTemplate};
use crate::report::{RunReport, ScenarioReport, TrialReport};
use crate::verify::{verify_batch, verify_sentinel};

/// First id of every scenario; the sentinel holds id 0.
pub const FIRST_BATCH_ID: DocId = 1;

/// All 32 scenarios.
///
/// Ordered with `continue_on_error` outermost, then fault location, force
/// first, force last and scramble innermost.
pub fn scenario_matrix() -> Vec<ScenarioOptions> {
    let mut scenarios = Vec::with_capacity(32);
    for continue_on_error in [false, true] {
        for fault_location in FaultLocation::ALL {
            for force_first_fault in [false, true] {
                for force_last_fault in [false, true] {
                    for scramble_partition_key in [false, true] {
                        scenarios.push(ScenarioOptions {
                            continue_on_error,
                            fault_location,
                            force_first_fault,
                            force_last_fault,
                            scramble_partition_key,
                        });
                    }
                }
            }
        }
    }
    scenarios
}

/// Restricts the scenario matrix; `None` leaves a dimension open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScenarioFilter {
    /// Error mode
    pub continue_on_error: Option<bool>,
    /// Fault location
    pub fault_location: Option<FaultLocation>,
    /// Force a fault at position 0
    pub force_first_fault: Option<bool>,
    /// Force a fault at the last position
    pub force_last_fault: Option<bool>,
    /// Scramble partition keys
    pub scramble_partition_key: Option<bool>,
}

impl ScenarioFilter {
    /// Filter accepting every scenario
    pub fn all() -> Self {
        Self::default()
    }

    /// Whether `options` passes the filter
    pub fn matches(&self, options: &ScenarioOptions) -> bool {
        fn open<T: PartialEq>(want: Option<T>, value: T) -> bool {
            want.map_or(true, |w| w == value)
        }

        open(self.continue_on_error, options.continue_on_error)
            && open(self.fault_location, options.fault_location)
            && open(self.force_first_fault, options.force_first_fault)
            && open(self.force_last_fault, options.force_last_fault)
            && open(self.scramble_partition_key, options.scramble_partition_key)
    }

    /// Scenarios of the matrix that pass the filter, in matrix order
    pub fn scenarios(&self) -> Vec<ScenarioOptions> {
        scenario_matrix()
            .into_iter()
            .filter(|options| self.matches(options))
            .collect()
    }
}

/// Drives scenarios against one store.
///
/// The store, configuration and RNG are owned per harness; nothing is
/// shared between harness instances.
pub struct Harness<'a, S: Store + ?Sized> {
    store: &'a S,
    collection: CollectionHandle,
    config: HarnessConfig,
    rng: StdRng,
    seed: u64,
    prepared: bool,
}

impl<'a, S: Store + ?Sized> Harness<'a, S> {
    /// Validate `config` and seed the RNG.
    ///
    /// Without a configured seed a random one is drawn; [`Harness::seed`]
    /// reports it so a failing run can be reproduced.
    pub fn new(store: &'a S, config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let collection = CollectionHandle::new(config.database.clone(), config.collection.clone());

        Ok(Self {
            store,
            collection,
            config,
            rng: StdRng::seed_from_u64(seed),
            seed,
            prepared: false,
        })
    }

    /// RNG seed of this run
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Collection under test
    pub fn collection(&self) -> &CollectionHandle {
        &self.collection
    }

    /// Harness configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Partition the collection and create its indexes. Runs once.
    pub fn setup(&mut self) -> Result<()> {
        if self.prepared {
            return Ok(());
        }

        self.store.enable_sharding(&self.collection.database)?;
        self.store
            .define_partition_key(&self.collection, PARTITION_KEY_FIELD)?;
        self.store
            .ensure_index(&self.collection, IndexSpec::CompoundPair)?;
        self.store
            .ensure_index(&self.collection, IndexSpec::UniqueSentinel)?;

        self.prepared = true;
        info!(collection = %self.collection, seed = self.seed, "Harness ready");
        Ok(())
    }

    /// Empty the collection and reseed the sentinel.
    pub fn reset(&self) -> Result<()> {
        let removed = self.store.remove_all(&self.collection)?;
        if self.config.seed_sentinel {
            self.store
                .insert_one(&self.collection, Document::sentinel())?;
        }
        debug!(removed, sentinel = self.config.seed_sentinel, "Collection reset");
        Ok(())
    }

    /// One generate, inject, submit, verify cycle.
    ///
    /// Returns the trial counters and the next free id.
    pub fn run_trial(
        &mut self,
        options: &ScenarioOptions,
        template: &FaultTemplate,
        next_id: DocId,
    ) -> Result<(TrialReport, DocId)> {
        let spec = BatchSpec {
            target_sizes: self.config.batch_sizes,
            document_sizes: self.config.document_sizes,
            start_id: next_id,
            scramble: options.scramble_partition_key,
        };
        let (mut batch, next_id) = generate_batch(&mut self.rng, &spec);
        let plan = inject_faults(&mut self.rng, &mut batch, template);

        let submission = submit(
            self.store,
            &self.collection,
            &batch,
            options.continue_on_error,
        )?;
        let tally = verify_batch(
            self.store,
            &self.collection,
            batch.documents(),
            options.continue_on_error,
        )?;
        if self.config.seed_sentinel {
            verify_sentinel(self.store, &self.collection)?;
        }

        let report = TrialReport {
            documents: batch.len() as u64,
            bytes: batch.serialized_size(),
            faults: plan.positions.len() as u64,
            present: tally.present,
            absent: tally.absent,
            reported_inserted: submission.outcome.inserted,
            reported_errors: submission.outcome.error_count,
        };
        Ok((report, next_id))
    }

    /// Reset the collection and run every trial of one scenario.
    pub fn run_scenario(&mut self, options: ScenarioOptions) -> Result<ScenarioReport> {
        self.setup()?;
        info!(
            scenario = %options,
            iterations = self.config.iterations,
            batch_sizes = %self.config.batch_sizes,
            document_sizes = %self.config.document_sizes,
            fault_counts = %self.config.fault_counts,
            storage_fault = %self.config.storage_fault,
            "Running scenario"
        );

        let started = Instant::now();
        let template = FaultTemplate::for_scenario(&options, &self.config);
        let mut report = ScenarioReport::new(options);

        self.reset().map_err(|e| scenario_failed(options, 0, e))?;

        let mut next_id = FIRST_BATCH_ID;
        for trial in 0..self.config.iterations {
            let (trial_report, next) = self
                .run_trial(&options, &template, next_id)
                .map_err(|e| scenario_failed(options, trial, e))?;
            debug!(
                trial,
                documents = trial_report.documents,
                bytes = trial_report.bytes,
                faults = trial_report.faults,
                "Trial passed"
            );
            report.record(&trial_report);
            next_id = next;
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            scenario = %options,
            trials = report.trials,
            documents = report.totals.documents,
            faults = report.totals.faults,
            elapsed_ms = report.elapsed_ms,
            "Scenario passed"
        );
        Ok(report)
    }

    /// Run every scenario accepted by `filter`, in matrix order.
    pub fn run(&mut self, filter: &ScenarioFilter) -> Result<RunReport> {
        let started = Instant::now();
        let mut run = RunReport::new(self.seed);
        self.setup()?;

        for options in filter.scenarios() {
            let report = self.run_scenario(options)?;
            run.scenarios.push(report);
        }

        run.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            run_id = %run.run_id,
            seed = self.seed,
            scenarios = run.scenarios.len(),
            trials = run.trials(),
            "Run passed"
        );
        Ok(run)
    }
}

fn scenario_failed(scenario: ScenarioOptions, trial: u64, source: HarnessError) -> HarnessError {
    error!(scenario = %scenario, trial, error = %source, "Scenario failed");
    HarnessError::ScenarioFailed {
        scenario,
        trial,
        source: Box::new(source),
    }
}
