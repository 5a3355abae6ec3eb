//! Codelet families and their registry
//!
//! A [`Family`] is the behaviour behind a codelet name. The
//! [`FamilyRegistry`] maps names to behaviours and is shared read-only by
//! every controller of a run, subspaces included. The scheduler never
//! special-cases individual families.

use crate::codelet::{Arguments, FamilyId};
use crate::controller::Controller;
use crate::error::FamilyError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// One executable codelet behaviour
///
/// Runs a single unit of work against the controller's workspace and
/// stream. A [`FamilyError::Conflict`] returned from here is intercepted by
/// the controller and resolved in a subspace.
pub trait Family: Send + Sync {
    /// Execute one codelet of this family
    ///
    /// # Errors
    /// Any [`FamilyError`]; conflicts are resolved, everything else ends the run
    fn run(&self, controller: &mut Controller, args: &Arguments) -> Result<(), FamilyError>;
}

impl<F> Family for F
where
    F: Fn(&mut Controller, &Arguments) -> Result<(), FamilyError> + Send + Sync,
{
    fn run(&self, controller: &mut Controller, args: &Arguments) -> Result<(), FamilyError> {
        self(controller, args)
    }
}

/// Name-keyed set of families
#[derive(Clone, Default)]
pub struct FamilyRegistry {
    families: BTreeMap<String, Arc<dyn Family>>,
}

impl FamilyRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a family under `name`
    pub fn register(&mut self, name: impl Into<String>, family: impl Family + 'static) {
        self.families.insert(name.into(), Arc::new(family));
    }

    /// Builder form of [`register`](Self::register)
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, family: impl Family + 'static) -> Self {
        self.register(name, family);
        self
    }

    /// Check if a family is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.families.contains_key(name)
    }

    /// Look up the family for a codelet
    #[must_use]
    pub fn get(&self, id: &FamilyId) -> Option<Arc<dyn Family>> {
        self.families.get(id.as_str()).cloned()
    }

    /// Remove a family
    pub fn remove(&mut self, name: &str) -> bool {
        self.families.remove(name).is_some()
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.families.keys().map(String::as_str).collect()
    }

    /// Number of registered families
    #[must_use]
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

impl fmt::Debug for FamilyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FamilyRegistry")
            .field("families", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Controller, _: &Arguments) -> Result<(), FamilyError> {
        Ok(())
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = FamilyRegistry::new();
        assert!(registry.is_empty());

        registry.register("noop", noop);
        registry.register("also", noop);

        assert!(registry.contains("noop"));
        assert!(registry.get(&FamilyId::from("noop")).is_some());
        assert!(registry.get(&FamilyId::from("missing")).is_none());
        assert_eq!(registry.names(), vec!["also", "noop"]);
    }

    #[test]
    fn remove_family() {
        let mut registry = FamilyRegistry::new().with("noop", noop);
        assert!(registry.remove("noop"));
        assert!(!registry.remove("noop"));
        assert_eq!(registry.len(), 0);
    }
}
