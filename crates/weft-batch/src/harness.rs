//! Batch statistics harness
//!
//! Runs every scenario `num_iterations` times, each run on a fresh
//! controller with a seed derived from (base seed, scenario, iteration),
//! appends the terminal outcomes to the scenario's distribution and
//! persists the result as a new snapshot. The most recent earlier snapshot
//! is loaded first as the "previous" baseline.
//!
//! The abort flag is only consulted between iterations. Whatever completed
//! before it tripped (or before an error) is still saved. In parallel mode
//! that is the leading run of completed iterations; later iterations that
//! finished after a skipped one are dropped.

use crate::compare::{compare, ScenarioComparison};
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::scenario::{RunFactory, Scenario};
use crate::snapshot::SnapshotStore;
use crate::stats::{Distributions, RunSample};
use parking_lot::Mutex;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use weft_kernel::{ConfigError, EngineConfig, StoppingCondition, StoppingConditionRegistry};

/// Shared flag that stops a batch between iterations
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// Unset flag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the batch to stop before its next iteration
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether [`abort`](Self::abort) was called
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Seed for one run: SHA-256 over base seed, scenario name and iteration
#[must_use]
pub fn derive_seed(base: u64, scenario: &str, iteration: usize) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update((scenario.len() as u64).to_le_bytes());
    hasher.update(scenario.as_bytes());
    hasher.update((iteration as u64).to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// What a batch produced
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Baseline loaded from the latest earlier snapshot
    pub previous: Option<Distributions>,
    /// Distributions produced by this batch
    pub current: Distributions,
    /// Snapshot written for `current`
    pub snapshot: PathBuf,
    /// Whether the abort flag cut the batch short
    pub aborted: bool,
}

impl BatchReport {
    /// Previous vs current, per scenario
    #[must_use]
    pub fn comparisons(&self) -> Vec<ScenarioComparison> {
        compare(self.previous.as_ref(), &self.current)
    }
}

/// Runs scenarios many times and aggregates their outcomes
pub struct BatchHarness {
    engine: EngineConfig,
    config: HarnessConfig,
    factory: Arc<dyn RunFactory>,
    stopping: Option<Arc<dyn StoppingCondition>>,
    abort: AbortHandle,
}

impl BatchHarness {
    /// Create a harness without a stopping condition
    pub fn new(engine: EngineConfig, config: HarnessConfig, factory: Arc<dyn RunFactory>) -> Self {
        Self {
            engine,
            config,
            factory,
            stopping: None,
            abort: AbortHandle::new(),
        }
    }

    /// Create a harness, resolving `config.stopping_condition` by name
    ///
    /// # Errors
    /// [`ConfigError::UnknownStoppingCondition`] for unregistered names
    pub fn from_registry(
        engine: EngineConfig,
        config: HarnessConfig,
        factory: Arc<dyn RunFactory>,
        conditions: &StoppingConditionRegistry,
    ) -> Result<Self, HarnessError> {
        let stopping = conditions.resolve(config.stopping_condition.as_deref())?;
        Ok(Self::new(engine, config, factory).with_stopping_condition(stopping))
    }

    /// With an already resolved stopping condition
    #[must_use]
    pub fn with_stopping_condition(mut self, stopping: Option<Arc<dyn StoppingCondition>>) -> Self {
        self.stopping = stopping;
        self
    }

    /// With a shared abort flag
    #[must_use]
    pub fn with_abort_handle(mut self, abort: AbortHandle) -> Self {
        self.abort = abort;
        self
    }

    /// Handle that aborts this harness between iterations
    #[must_use]
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Harness settings
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run every scenario and persist the distributions
    ///
    /// # Errors
    /// - [`ConfigError::MissingInputSpecification`] for an empty scenario list
    /// - [`HarnessError::Snapshot`] when the new snapshot cannot be written
    /// - any error from building or running a scenario, after the completed
    ///   samples have been saved
    pub fn run(&self, scenarios: &[Scenario]) -> Result<BatchReport, HarnessError> {
        if scenarios.is_empty() {
            return Err(ConfigError::MissingInputSpecification("no scenarios given".into()).into());
        }
        self.engine.validate()?;

        let store = SnapshotStore::new(&self.config.stats_directory);
        let previous = match store.load_latest() {
            Ok(snapshot) => snapshot.map(|s| s.distributions),
            Err(error) => {
                warn!(%error, "previous snapshot unreadable; comparing against nothing");
                None
            }
        };

        let current = Mutex::new(Distributions::new());
        let outcome = self.run_scenarios(scenarios, &current);
        let current = current.into_inner();

        let snapshot = store.save(&current)?;
        let aborted = outcome?;
        if aborted {
            warn!(samples = current.total_samples(), "batch aborted");
        }
        Ok(BatchReport {
            previous,
            current,
            snapshot,
            aborted,
        })
    }

    /// Returns whether the batch was aborted
    fn run_scenarios(
        &self,
        scenarios: &[Scenario],
        current: &Mutex<Distributions>,
    ) -> Result<bool, HarnessError> {
        for scenario in scenarios {
            current.lock().ensure(scenario.name());
        }

        for scenario in scenarios {
            info!(
                scenario = scenario.name(),
                iterations = self.config.num_iterations,
                parallel = self.config.parallel,
                "scenario started"
            );
            let aborted = if self.config.parallel {
                self.run_parallel(scenario, current)?
            } else {
                self.run_sequential(scenario, current)?
            };
            if aborted {
                return Ok(true);
            }
            if let Some(distribution) = current.lock().get(scenario.name()) {
                let summary = distribution.summary();
                info!(
                    scenario = scenario.name(),
                    runs = summary.runs,
                    success_rate = summary.success_rate,
                    mean_steps = summary.mean_steps,
                    "scenario finished"
                );
            }
        }
        Ok(false)
    }

    fn run_sequential(
        &self,
        scenario: &Scenario,
        current: &Mutex<Distributions>,
    ) -> Result<bool, HarnessError> {
        for iteration in 0..self.config.num_iterations {
            if self.abort.is_aborted() {
                return Ok(true);
            }
            let sample = self.run_one(scenario, iteration)?;
            current.lock().append(scenario.name(), sample);
        }
        Ok(false)
    }

    fn run_parallel(
        &self,
        scenario: &Scenario,
        current: &Mutex<Distributions>,
    ) -> Result<bool, HarnessError> {
        let results: Vec<Option<Result<RunSample, HarnessError>>> = (0..self.config.num_iterations)
            .into_par_iter()
            .map(|iteration| {
                if self.abort.is_aborted() {
                    None
                } else {
                    Some(self.run_one(scenario, iteration))
                }
            })
            .collect();

        // Keep only the leading run of completed iterations, as a sequential
        // batch would have.
        let mut distributions = current.lock();
        for result in results {
            let Some(sample) = result else {
                return Ok(true);
            };
            distributions.append(scenario.name(), sample?);
        }
        Ok(false)
    }

    fn run_one(&self, scenario: &Scenario, iteration: usize) -> Result<RunSample, HarnessError> {
        let seed = derive_seed(self.engine.seed, scenario.name(), iteration);
        let config = self.engine.clone().with_seed(seed);
        let mut controller = self.factory.build(scenario, config)?;
        let report = controller.run(self.stopping.as_deref())?;
        debug!(
            scenario = scenario.name(),
            iteration,
            seed,
            steps = report.steps_executed,
            reason = %report.reason,
            "iteration finished"
        );
        Ok(RunSample {
            steps: report.steps_executed,
            reason: report.reason,
            seed,
            metrics: controller.metrics(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_depend_on_every_input() {
        let base = derive_seed(1, "a", 0);
        assert_eq!(base, derive_seed(1, "a", 0));
        assert_ne!(base, derive_seed(2, "a", 0));
        assert_ne!(base, derive_seed(1, "b", 0));
        assert_ne!(base, derive_seed(1, "a", 1));
    }

    #[test]
    fn abort_handle_is_shared() {
        let handle = AbortHandle::new();
        let clone = handle.clone();
        assert!(!clone.is_aborted());
        handle.abort();
        assert!(clone.is_aborted());
    }
}
