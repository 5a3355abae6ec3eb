//! Subspaces: bounded, isolated adjudication of structural conflicts
//!
//! A subspace is a child [`Controller`] over a snapshot of the parent
//! workspace with its own stream. An [`Adjudicator`] seeds it with codelets
//! and decides, after each step, whether a verdict has been reached. The
//! parent is only borrowed immutably while this happens; the outcome is
//! applied afterwards by [`Controller::commit`].

use crate::codelet::Codelet;
use crate::controller::Controller;
use crate::error::FamilyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;
use weft_workspace::{Group, GroupId};

/// Which side of a conflict a subspace settled on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// The proposed group should replace the incumbents
    Proposal,
    /// The incumbents should stay
    Incumbents,
}

/// Result of one conflict resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Remove the incumbents and insert the proposal, atomically
    ReplaceWithProposal,
    /// Discard the proposal
    KeepIncumbents,
    /// No decision was reached; the proposal is discarded
    NoChange,
}

impl From<Verdict> for Outcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Proposal => Self::ReplaceWithProposal,
            Verdict::Incumbents => Self::KeepIncumbents,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReplaceWithProposal => "replace_with_proposal",
            Self::KeepIncumbents => "keep_incumbents",
            Self::NoChange => "no_change",
        };
        f.write_str(name)
    }
}

/// The two alternatives a subspace chooses between
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contest {
    proposal: Group,
    incumbents: Vec<(GroupId, Group)>,
}

impl Contest {
    /// Create a contest
    #[must_use]
    pub fn new(proposal: Group, incumbents: Vec<(GroupId, Group)>) -> Self {
        Self {
            proposal,
            incumbents,
        }
    }

    /// Group that lost the insert
    #[inline]
    #[must_use]
    pub fn proposal(&self) -> &Group {
        &self.proposal
    }

    /// Overlapping groups, ordered by id
    #[inline]
    #[must_use]
    pub fn incumbents(&self) -> &[(GroupId, Group)] {
        &self.incumbents
    }
}

/// Pluggable seed and success criterion for subspaces
pub trait Adjudicator: Send + Sync {
    /// Codelets the subspace stream starts with
    fn seed(&self, contest: &Contest) -> Vec<Codelet>;

    /// Checked after every subspace step; `Some` ends the subspace
    ///
    /// Defaults to the verdict declared by a codelet through
    /// [`Controller::declare_verdict`].
    fn verdict(&self, subspace: &Controller) -> Option<Verdict> {
        subspace.declared_verdict()
    }
}

/// Seeds nothing and reads the declared verdict
///
/// On its own every conflict ends in [`Outcome::NoChange`]; pair it with
/// routine codelets that declare verdicts, or use a richer adjudicator.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredVerdict;

impl Adjudicator for DeclaredVerdict {
    fn seed(&self, _contest: &Contest) -> Vec<Codelet> {
        Vec::new()
    }
}

/// One conflict resolution in progress
pub(crate) struct Subspace {
    controller: Controller,
}

impl Subspace {
    pub(crate) fn spawn(parent: &Controller, contest: Contest) -> Self {
        let adjudicator = parent.adjudicator();
        let seeds = adjudicator.seed(&contest);
        let mut controller = parent.spawn_child(contest);
        for codelet in seeds {
            controller.insert(codelet);
        }
        Self { controller }
    }

    /// Step until a verdict, the budget runs out or the stream runs dry
    pub(crate) fn run(mut self, step_budget: u64) -> Result<Outcome, FamilyError> {
        let adjudicator = self.controller.adjudicator();
        for _ in 0..step_budget {
            let had_work = self.controller.step()?;
            if let Some(verdict) = adjudicator.verdict(&self.controller) {
                trace!(
                    depth = self.controller.depth(),
                    steps = self.controller.steps(),
                    ?verdict,
                    "subspace decided"
                );
                return Ok(verdict.into());
            }
            if !had_work {
                break;
            }
        }
        trace!(
            depth = self.controller.depth(),
            steps = self.controller.steps(),
            "subspace undecided"
        );
        Ok(Outcome::NoChange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codelet::{Arguments, Urgency};
    use crate::config::EngineConfig;
    use crate::family::FamilyRegistry;
    use std::sync::Arc;
    use weft_workspace::{Mapping, Span};

    fn group(start: usize, end: usize) -> Group {
        Group::new(Span::new(start, end).unwrap(), Mapping::new("same"))
    }

    /// Seeds one `decide` codelet
    struct SeedDecide;

    impl Adjudicator for SeedDecide {
        fn seed(&self, _contest: &Contest) -> Vec<Codelet> {
            vec![Codelet::new("decide", Arguments::new(), Urgency::NORMAL)]
        }
    }

    fn decide(controller: &mut Controller, _: &Arguments) -> Result<(), FamilyError> {
        // Scribble on the snapshot to prove the parent never sees it.
        controller.workspace_mut().add_item(99);
        controller.declare_verdict(Verdict::Proposal);
        Ok(())
    }

    fn parent() -> Controller {
        let registry = FamilyRegistry::new().with("decide", decide);
        let mut c = Controller::new(EngineConfig::default(), Arc::new(registry))
            .unwrap()
            .with_adjudicator(Arc::new(SeedDecide));
        c.workspace_mut().insert_group(group(2, 5)).unwrap();
        c
    }

    fn incumbents(c: &Controller) -> Vec<(GroupId, Group)> {
        c.workspace().overlapping(Span::new(3, 4).unwrap())
    }

    #[test]
    fn zero_budget_is_no_change() {
        let c = parent();
        let outcome = c.resolve(&group(3, 4), &incumbents(&c), 0).unwrap();
        assert_eq!(outcome, Outcome::NoChange);
    }

    #[test]
    fn declared_verdict_decides() {
        let c = parent();
        let outcome = c.resolve(&group(3, 4), &incumbents(&c), 5).unwrap();
        assert_eq!(outcome, Outcome::ReplaceWithProposal);
    }

    #[test]
    fn parent_is_untouched_by_subspace_work() {
        let c = parent();
        let items_before = c.workspace().item_count();
        c.resolve(&group(3, 4), &incumbents(&c), 5).unwrap();
        assert_eq!(c.workspace().item_count(), items_before);
        assert_eq!(c.steps(), 0);
        assert_eq!(c.workspace().group_count(), 1);
    }

    #[test]
    fn default_adjudicator_runs_dry() {
        let registry = Arc::new(FamilyRegistry::new());
        let mut c = Controller::new(EngineConfig::default(), registry).unwrap();
        c.workspace_mut().insert_group(group(2, 5)).unwrap();
        let incumbents = incumbents(&c);
        assert_eq!(
            c.resolve(&group(3, 4), &incumbents, 50).unwrap(),
            Outcome::NoChange
        );
    }

    #[test]
    fn verdict_maps_to_outcome() {
        assert_eq!(Outcome::from(Verdict::Proposal), Outcome::ReplaceWithProposal);
        assert_eq!(Outcome::from(Verdict::Incumbents), Outcome::KeepIncumbents);
    }
}
