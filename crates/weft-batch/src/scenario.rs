//! Scenarios and the factories that turn them into runs

use crate::error::HarnessError;
use std::fmt;
use std::sync::Arc;
use weft_kernel::families::{self, DescribeAs, FindRelation, SpanLengthAdjudicator};
use weft_kernel::{Adjudicator, Arguments, ConfigError, Controller, EngineConfig, FamilyRegistry, Urgency};
use weft_workspace::{ItemId, Workspace};

/// Named input configuration executed repeatedly by the harness
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    name: String,
    arguments: Arguments,
}

impl Scenario {
    /// Scenario named `name`
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Name used in distributions and seeds
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments handed to the run factory
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }
}

/// Builds a fresh, seeded controller for one iteration of a scenario
///
/// `config` already carries the per-run seed.
pub trait RunFactory: Send + Sync {
    /// # Errors
    /// [`HarnessError`] when the scenario cannot be turned into a run
    fn build(&self, scenario: &Scenario, config: EngineConfig) -> Result<Controller, HarnessError>;
}

impl<F> RunFactory for F
where
    F: Fn(&Scenario, EngineConfig) -> Result<Controller, HarnessError> + Send + Sync,
{
    fn build(&self, scenario: &Scenario, config: EngineConfig) -> Result<Controller, HarnessError> {
        self(scenario, config)
    }
}

/// Run factory for the built-in families
///
/// Reads a whitespace-separated integer `sequence` argument into items,
/// seeds one `find_relation` codelet per item plus low-urgency parity
/// descriptions, and re-posts the `find_relation` codelets as routine work.
#[derive(Clone)]
pub struct SequenceSetup {
    registry: Arc<FamilyRegistry>,
    adjudicator: Arc<dyn Adjudicator>,
}

impl SequenceSetup {
    /// Factory with a custom registry and adjudicator
    pub fn new(registry: Arc<FamilyRegistry>, adjudicator: Arc<dyn Adjudicator>) -> Self {
        Self {
            registry,
            adjudicator,
        }
    }

    fn parse_sequence(scenario: &Scenario) -> Result<Vec<i64>, HarnessError> {
        let text = scenario.arguments().text("sequence").map_err(|_| {
            ConfigError::MissingInputSpecification(format!(
                "scenario '{}' has no text argument 'sequence'",
                scenario.name()
            ))
        })?;
        text.split_whitespace()
            .map(|token| {
                token.parse::<i64>().map_err(|e| HarnessError::Scenario {
                    scenario: scenario.name().to_string(),
                    message: format!("bad sequence value '{token}': {e}"),
                })
            })
            .collect()
    }
}

impl Default for SequenceSetup {
    fn default() -> Self {
        Self::new(
            Arc::new(families::builtin_registry()),
            Arc::new(SpanLengthAdjudicator::default()),
        )
    }
}

impl fmt::Debug for SequenceSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceSetup")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl RunFactory for SequenceSetup {
    fn build(&self, scenario: &Scenario, config: EngineConfig) -> Result<Controller, HarnessError> {
        let values = Self::parse_sequence(scenario)?;
        let positions = 0..values.len();
        let low = Urgency::new(0.5).map_err(|e| HarnessError::Scenario {
            scenario: scenario.name().to_string(),
            message: e.to_string(),
        })?;

        let routine: Vec<_> = positions
            .clone()
            .map(|i| FindRelation::codelet(ItemId(i), Urgency::NORMAL))
            .collect();
        let mut controller = Controller::new(config, Arc::clone(&self.registry))?
            .with_workspace(Workspace::with_items(values.iter().copied()))
            .with_adjudicator(Arc::clone(&self.adjudicator))
            .with_routine(routine.clone());

        for codelet in routine {
            controller.insert(codelet);
        }
        for (i, value) in positions.zip(&values) {
            let parity = if value % 2 == 0 { "even" } else { "odd" };
            controller.insert(DescribeAs::codelet(ItemId(i), parity, low));
        }
        Ok(controller)
    }
}
