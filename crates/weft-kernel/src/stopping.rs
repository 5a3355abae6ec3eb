//! Stopping conditions and their name registry
//!
//! A stopping condition is a predicate over the controller evaluated
//! between steps. Drivers pick one by name at startup; unknown names are a
//! configuration error.

use crate::controller::Controller;
use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Name that selects "no stopping condition"
pub const NO_STOPPING_CONDITION: &str = "None";

/// Predicate that ends a run cleanly when it holds
pub trait StoppingCondition: Send + Sync {
    /// Whether the run should stop now
    fn is_met(&self, controller: &Controller) -> bool;
}

impl<F> StoppingCondition for F
where
    F: Fn(&Controller) -> bool + Send + Sync,
{
    fn is_met(&self, controller: &Controller) -> bool {
        self(controller)
    }
}

/// Name-keyed set of stopping conditions
#[derive(Clone, Default)]
pub struct StoppingConditionRegistry {
    conditions: BTreeMap<String, Arc<dyn StoppingCondition>>,
}

impl StoppingConditionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a condition
    pub fn register(&mut self, name: impl Into<String>, condition: impl StoppingCondition + 'static) {
        self.conditions.insert(name.into(), Arc::new(condition));
    }

    /// Check if a condition is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.conditions.contains_key(name)
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.conditions.keys().cloned().collect()
    }

    /// Resolve an optional name
    ///
    /// `None`, an empty name and `"None"` all mean "no condition".
    ///
    /// # Errors
    /// [`ConfigError::UnknownStoppingCondition`] listing the known names
    pub fn resolve(
        &self,
        name: Option<&str>,
    ) -> Result<Option<Arc<dyn StoppingCondition>>, ConfigError> {
        let Some(name) = name.map(str::trim) else {
            return Ok(None);
        };
        if name.is_empty() || name == NO_STOPPING_CONDITION {
            return Ok(None);
        }
        self.conditions
            .get(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| ConfigError::UnknownStoppingCondition {
                name: name.to_string(),
                known: self.names(),
            })
    }
}

impl fmt::Debug for StoppingConditionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoppingConditionRegistry")
            .field("conditions", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> StoppingConditionRegistry {
        let mut registry = StoppingConditionRegistry::new();
        registry.register("any_group", |c: &Controller| c.workspace().group_count() > 0);
        registry
    }

    #[test]
    fn none_names_resolve_to_no_condition() {
        let registry = registry();
        assert!(registry.resolve(None).unwrap().is_none());
        assert!(registry.resolve(Some("None")).unwrap().is_none());
        assert!(registry.resolve(Some("")).unwrap().is_none());
    }

    #[test]
    fn known_name_resolves() {
        assert!(registry().resolve(Some("any_group")).unwrap().is_some());
    }

    #[test]
    fn unknown_name_is_a_config_error() {
        let err = registry().resolve(Some("bogus")).err().unwrap();
        assert_eq!(
            err,
            ConfigError::UnknownStoppingCondition {
                name: "bogus".into(),
                known: vec!["any_group".into()],
            }
        );
    }
}
