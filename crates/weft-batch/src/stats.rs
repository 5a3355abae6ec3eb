//! Run samples and per-scenario distributions
//!
//! Distributions only grow: the harness appends one [`RunSample`] per
//! completed iteration. Scenario order is insertion order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use weft_kernel::TerminationReason;

/// Terminal outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSample {
    /// Steps executed
    pub steps: u64,
    /// Why the run stopped
    pub reason: TerminationReason,
    /// Seed the run's stream was created with
    pub seed: u64,
    /// Domain metrics taken from the controller at the end of the run
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

/// All samples for one scenario
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    samples: Vec<RunSample>,
}

impl Distribution {
    /// Append a sample
    pub fn push(&mut self, sample: RunSample) {
        self.samples.push(sample);
    }

    /// Samples in insertion order
    #[inline]
    #[must_use]
    pub fn samples(&self) -> &[RunSample] {
        &self.samples
    }

    /// Sample count
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no samples were recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Aggregate view
    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary::of(&self.samples)
    }
}

/// Counts and step statistics of a distribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Sample count
    pub runs: usize,
    /// Sample count per termination reason
    pub by_reason: BTreeMap<String, usize>,
    /// Share of runs that met the stopping condition (0 when empty)
    pub success_rate: f64,
    /// Mean steps per run
    pub mean_steps: f64,
    /// Median steps per run
    pub median_steps: f64,
}

impl Summary {
    #[allow(clippy::cast_precision_loss)]
    fn of(samples: &[RunSample]) -> Self {
        let runs = samples.len();
        let mut by_reason = BTreeMap::new();
        for sample in samples {
            *by_reason.entry(sample.reason.to_string()).or_insert(0) += 1;
        }
        if runs == 0 {
            return Self {
                runs,
                by_reason,
                success_rate: 0.0,
                mean_steps: 0.0,
                median_steps: 0.0,
            };
        }

        let successes = samples.iter().filter(|s| s.reason.is_success()).count();
        let mut steps: Vec<u64> = samples.iter().map(|s| s.steps).collect();
        steps.sort_unstable();
        let mean_steps = steps.iter().map(|&s| s as f64).sum::<f64>() / runs as f64;
        let mid = runs / 2;
        let median_steps = if runs % 2 == 0 {
            (steps[mid - 1] as f64 + steps[mid] as f64) / 2.0
        } else {
            steps[mid] as f64
        };

        Self {
            runs,
            by_reason,
            success_rate: successes as f64 / runs as f64,
            mean_steps,
            median_steps,
        }
    }
}

/// Scenario name to distribution, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distributions(IndexMap<String, Distribution>);

impl Distributions {
    /// No scenarios
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `scenario` has an entry, possibly empty
    pub fn ensure(&mut self, scenario: &str) {
        if !self.0.contains_key(scenario) {
            self.0.insert(scenario.to_string(), Distribution::default());
        }
    }

    /// Append a sample to `scenario`'s distribution
    pub fn append(&mut self, scenario: &str, sample: RunSample) {
        self.ensure(scenario);
        if let Some(distribution) = self.0.get_mut(scenario) {
            distribution.push(sample);
        }
    }

    /// Distribution for `scenario`
    #[must_use]
    pub fn get(&self, scenario: &str) -> Option<&Distribution> {
        self.0.get(scenario)
    }

    /// Scenarios with their distributions, in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Distribution)> {
        self.0.iter().map(|(name, d)| (name.as_str(), d))
    }

    /// Scenario names in first-seen order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Scenario count
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no scenario is known
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Samples across all scenarios
    #[must_use]
    pub fn total_samples(&self) -> usize {
        self.0.values().map(Distribution::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use weft_kernel::ErrorKind;

    fn sample(steps: u64, reason: TerminationReason) -> RunSample {
        RunSample {
            steps,
            reason,
            seed: 0,
            metrics: BTreeMap::new(),
        }
    }

    #[test]
    fn summary_of_empty_distribution() {
        let summary = Distribution::default().summary();
        assert_eq!(summary.runs, 0);
        assert!(summary.by_reason.is_empty());
        assert_eq!(summary.success_rate, 0.0);
    }

    #[test]
    fn summary_counts_and_statistics() {
        let mut d = Distribution::default();
        d.push(sample(10, TerminationReason::StoppingConditionMet));
        d.push(sample(30, TerminationReason::StepCapReached));
        d.push(sample(20, TerminationReason::StoppingConditionMet));
        d.push(sample(
            40,
            TerminationReason::Errored(ErrorKind::FamilyFailed),
        ));

        let summary = d.summary();
        assert_eq!(summary.runs, 4);
        assert_eq!(summary.by_reason["stopping_condition_met"], 2);
        assert_eq!(summary.by_reason["step_cap_reached"], 1);
        assert_eq!(summary.by_reason["errored(family_failed)"], 1);
        assert!((summary.success_rate - 0.5).abs() < 1e-12);
        assert!((summary.mean_steps - 25.0).abs() < 1e-12);
        assert!((summary.median_steps - 25.0).abs() < 1e-12);
    }

    #[test]
    fn scenarios_keep_insertion_order() {
        let mut ds = Distributions::new();
        ds.append("zeta", sample(1, TerminationReason::StepCapReached));
        ds.ensure("alpha");
        ds.append("zeta", sample(2, TerminationReason::StepCapReached));

        assert_eq!(ds.names().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(ds.get("zeta").map(Distribution::len), Some(2));
        assert_eq!(ds.total_samples(), 2);
    }

    proptest! {
        #[test]
        fn summary_bounds_hold(steps in prop::collection::vec(0u64..500, 1..40), met in 0usize..40) {
            let mut d = Distribution::default();
            for (i, s) in steps.iter().enumerate() {
                let reason = if i < met {
                    TerminationReason::StoppingConditionMet
                } else {
                    TerminationReason::StepCapReached
                };
                d.push(sample(*s, reason));
            }
            let summary = d.summary();
            let lo = *steps.iter().min().unwrap() as f64;
            let hi = *steps.iter().max().unwrap() as f64;

            prop_assert_eq!(summary.runs, steps.len());
            prop_assert_eq!(summary.by_reason.values().sum::<usize>(), steps.len());
            prop_assert!((0.0..=1.0).contains(&summary.success_rate));
            prop_assert!(summary.mean_steps >= lo && summary.mean_steps <= hi);
            prop_assert!(summary.median_steps >= lo && summary.median_steps <= hi);
        }
    }
}
