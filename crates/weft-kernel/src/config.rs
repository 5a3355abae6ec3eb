//! Engine configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Settings for one controller and the subspaces it spawns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed of the run's random source
    pub seed: u64,
    /// Steps after which a run stops with `StepCapReached`
    pub max_steps: u64,
    /// Step budget handed to each conflict subspace
    pub subspace_step_budget: u64,
    /// Nesting limit for subspaces; conflicts deeper than this are left unresolved
    pub max_subspace_depth: u32,
    /// Evaluate the stopping condition every this many steps
    pub stopping_check_interval: u64,
    /// Re-insert routine codelets every this many steps (0 disables)
    pub routine_interval: u64,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// With step cap
    #[inline]
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// With subspace step budget
    #[inline]
    #[must_use]
    pub fn with_subspace_step_budget(mut self, budget: u64) -> Self {
        self.subspace_step_budget = budget;
        self
    }

    /// With subspace nesting limit
    #[inline]
    #[must_use]
    pub fn with_max_subspace_depth(mut self, depth: u32) -> Self {
        self.max_subspace_depth = depth;
        self
    }

    /// With stopping-check interval
    #[inline]
    #[must_use]
    pub fn with_stopping_check_interval(mut self, interval: u64) -> Self {
        self.stopping_check_interval = interval;
        self
    }

    /// With routine-codelet interval
    #[inline]
    #[must_use]
    pub fn with_routine_interval(mut self, interval: u64) -> Self {
        self.routine_interval = interval;
        self
    }

    /// Check ranges
    ///
    /// # Errors
    /// [`ConfigError::InvalidConfiguration`] when `max_steps` or
    /// `stopping_check_interval` is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_steps == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "max_steps must be at least 1".into(),
            ));
        }
        if self.stopping_check_interval == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "stopping_check_interval must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_steps: 1000,
            subspace_step_budget: 20,
            max_subspace_depth: 2,
            stopping_check_interval: 1,
            routine_interval: 0,
        }
    }
}
