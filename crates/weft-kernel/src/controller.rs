//! The controller: one stream, one workspace, one step loop
//!
//! Each step draws a codelet and runs its family to completion. A
//! [`FamilyError::Conflict`] from the family is caught here and resolved in
//! a subspace; the outcome is committed through a single
//! [`WorkspaceDelta`]. Every other family error ends the run.

use crate::codelet::Codelet;
use crate::config::EngineConfig;
use crate::error::{ConfigError, FamilyError, StateMachineError};
use crate::family::FamilyRegistry;
use crate::state_machine::{validate_transition, RunState, TerminationReason};
use crate::stopping::StoppingCondition;
use crate::stream::Stream;
use crate::subspace::{Adjudicator, Contest, DeclaredVerdict, Outcome, Subspace, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use weft_workspace::{DeltaError, Group, GroupId, StructuralConflict, Workspace, WorkspaceDelta};

/// How a finished run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationReport {
    /// Steps taken, idle steps on an empty stream included
    pub steps_executed: u64,
    /// Why the run stopped
    pub reason: TerminationReason,
}

/// Conflict bookkeeping for one controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionTally {
    /// Conflicts caught
    pub conflicts: u64,
    /// Resolved by replacing the incumbents
    pub replacements: u64,
    /// Resolved in favour of the incumbents
    pub kept: u64,
    /// Left as they were: budget exhausted, queue dry or depth limit
    pub unresolved: u64,
}

/// Drives one run
pub struct Controller {
    config: Arc<EngineConfig>,
    registry: Arc<FamilyRegistry>,
    adjudicator: Arc<dyn Adjudicator>,
    stream: Stream,
    workspace: Workspace,
    routine: Vec<Codelet>,
    state: RunState,
    steps: u64,
    depth: u32,
    contest: Option<Arc<Contest>>,
    verdict: Option<Verdict>,
    tally: ResolutionTally,
}

impl Controller {
    /// Create a controller with an empty workspace and stream
    ///
    /// The stream is seeded with `config.seed`. Conflicts are adjudicated by
    /// [`DeclaredVerdict`] unless [`with_adjudicator`](Self::with_adjudicator)
    /// is used.
    ///
    /// # Errors
    /// [`ConfigError::InvalidConfiguration`] if the config does not validate
    pub fn new(config: EngineConfig, registry: Arc<FamilyRegistry>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            stream: Stream::new(config.seed),
            config: Arc::new(config),
            registry,
            adjudicator: Arc::new(DeclaredVerdict),
            workspace: Workspace::new(),
            routine: Vec::new(),
            state: RunState::Created,
            steps: 0,
            depth: 0,
            contest: None,
            verdict: None,
            tally: ResolutionTally::default(),
        })
    }

    /// With initial workspace
    #[must_use]
    pub fn with_workspace(mut self, workspace: Workspace) -> Self {
        self.workspace = workspace;
        self
    }

    /// With conflict adjudicator
    #[must_use]
    pub fn with_adjudicator(mut self, adjudicator: Arc<dyn Adjudicator>) -> Self {
        self.adjudicator = adjudicator;
        self
    }

    /// With routine codelets, re-inserted every `routine_interval` steps
    #[must_use]
    pub fn with_routine(mut self, routine: Vec<Codelet>) -> Self {
        self.routine = routine;
        self
    }

    /// Nested controller for a subspace: snapshot workspace, forked stream
    pub(crate) fn spawn_child(&self, contest: Contest) -> Controller {
        Controller {
            config: Arc::clone(&self.config),
            registry: Arc::clone(&self.registry),
            adjudicator: Arc::clone(&self.adjudicator),
            stream: self.stream.fork(),
            workspace: self.workspace.clone(),
            routine: Vec::new(),
            state: RunState::Running,
            steps: 0,
            depth: self.depth + 1,
            contest: Some(Arc::new(contest)),
            verdict: None,
            tally: ResolutionTally::default(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Engine settings for this run
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Structure built so far
    #[inline]
    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Mutable workspace, for families
    #[inline]
    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    /// Pending codelets
    #[inline]
    #[must_use]
    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    /// Families this controller dispatches to
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &FamilyRegistry {
        &self.registry
    }

    #[inline]
    pub(crate) fn adjudicator(&self) -> Arc<dyn Adjudicator> {
        Arc::clone(&self.adjudicator)
    }

    /// Lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Steps taken so far
    #[inline]
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Subspace nesting depth (0 for a top-level run)
    #[inline]
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The conflict this controller adjudicates, when it is a subspace
    #[inline]
    #[must_use]
    pub fn contest(&self) -> Option<&Contest> {
        self.contest.as_deref()
    }

    /// Verdict declared by a codelet, if any
    #[inline]
    #[must_use]
    pub fn declared_verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    /// Declare the subspace verdict; the first declaration stands
    pub fn declare_verdict(&mut self, verdict: Verdict) {
        if self.verdict.is_none() {
            debug!(depth = self.depth, ?verdict, "verdict declared");
            self.verdict = Some(verdict);
        }
    }

    /// Conflict resolution counters
    #[inline]
    #[must_use]
    pub fn tally(&self) -> ResolutionTally {
        self.tally
    }

    /// Domain metrics recorded with each batch sample
    #[must_use]
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        #[allow(clippy::cast_precision_loss)]
        let entries = [
            ("groups", self.workspace.group_count() as f64),
            ("items", self.workspace.item_count() as f64),
            ("relations", self.workspace.relation_count() as f64),
            ("conflicts", self.tally.conflicts as f64),
            ("replacements", self.tally.replacements as f64),
            ("kept", self.tally.kept as f64),
            ("unresolved", self.tally.unresolved as f64),
        ];
        entries
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    // ------------------------------------------------------------------
    // Scheduling
    // ------------------------------------------------------------------

    /// Add a codelet to the stream
    pub fn insert(&mut self, codelet: Codelet) {
        self.stream.insert(codelet);
    }

    /// Take one step: draw a codelet and run it
    ///
    /// Returns whether the stream had work. An idle step still counts
    /// toward the step cap. A finished run takes no further steps.
    ///
    /// # Errors
    /// Any non-conflict [`FamilyError`]; conflicts are resolved here
    pub fn step(&mut self) -> Result<bool, FamilyError> {
        match self.state {
            RunState::Created => self.state = RunState::Running,
            RunState::Running => {}
            RunState::Completed(_) | RunState::Aborted => return Ok(false),
        }

        let interval = self.config.routine_interval;
        if interval > 0 && self.steps > 0 && self.steps % interval == 0 {
            for codelet in &self.routine {
                self.stream.insert(codelet.clone());
            }
        }

        self.steps += 1;
        let Some(codelet) = self.stream.draw()? else {
            debug!(step = self.steps, depth = self.depth, "stream empty");
            return Ok(false);
        };
        self.execute(&codelet)?;
        Ok(true)
    }

    fn execute(&mut self, codelet: &Codelet) -> Result<(), FamilyError> {
        let family = self
            .registry
            .get(codelet.family())
            .ok_or_else(|| FamilyError::UnknownFamily(codelet.family().to_string()))?;
        debug!(step = self.steps, depth = self.depth, codelet = %codelet, "executing");

        match family.run(self, codelet.arguments()) {
            Err(FamilyError::Conflict(conflict)) => self.handle_conflict(conflict),
            other => other,
        }
    }

    fn handle_conflict(&mut self, conflict: StructuralConflict) -> Result<(), FamilyError> {
        self.tally.conflicts += 1;
        let (proposal, incumbents) = conflict.into_parts();

        let outcome = if self.depth >= self.config.max_subspace_depth {
            debug!(depth = self.depth, %proposal, "subspace depth limit reached");
            Outcome::NoChange
        } else {
            self.resolve(&proposal, &incumbents, self.config.subspace_step_budget)?
        };
        self.commit(outcome, proposal, &incumbents)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Conflict resolution
    // ------------------------------------------------------------------

    /// Adjudicate `proposal` against `incumbents` in an isolated subspace
    ///
    /// Borrows the controller immutably: nothing here can touch this
    /// controller's workspace or stream. Apply the result with
    /// [`commit`](Self::commit).
    ///
    /// # Errors
    /// Non-conflict family errors raised inside the subspace
    pub fn resolve(
        &self,
        proposal: &Group,
        incumbents: &[(GroupId, Group)],
        step_budget: u64,
    ) -> Result<Outcome, FamilyError> {
        let contest = Contest::new(proposal.clone(), incumbents.to_vec());
        let outcome = Subspace::spawn(self, contest).run(step_budget)?;
        debug!(depth = self.depth, %proposal, incumbents = incumbents.len(), %outcome, "conflict resolved");
        Ok(outcome)
    }

    /// Apply a resolution outcome atomically
    ///
    /// Returns the id of the inserted proposal for
    /// [`Outcome::ReplaceWithProposal`], `None` otherwise.
    ///
    /// # Errors
    /// [`DeltaError`] if the incumbents changed since the conflict was
    /// raised; the workspace is then unchanged
    pub fn commit(
        &mut self,
        outcome: Outcome,
        proposal: Group,
        incumbents: &[(GroupId, Group)],
    ) -> Result<Option<GroupId>, DeltaError> {
        match outcome {
            Outcome::ReplaceWithProposal => {
                let delta = WorkspaceDelta::replace(incumbents.iter().map(|(id, _)| *id), proposal);
                let inserted = self.workspace.apply(delta)?;
                self.tally.replacements += 1;
                Ok(inserted.first().copied())
            }
            Outcome::KeepIncumbents => {
                self.tally.kept += 1;
                Ok(None)
            }
            Outcome::NoChange => {
                self.tally.unresolved += 1;
                Ok(None)
            }
        }
    }

    // ------------------------------------------------------------------
    // Run loop
    // ------------------------------------------------------------------

    /// Run until the stopping condition holds, the step cap is reached or a
    /// family fails
    ///
    /// The condition is checked before the first step and then every
    /// `stopping_check_interval` steps, never mid-codelet.
    ///
    /// # Errors
    /// [`StateMachineError`] when the run already finished or was aborted
    pub fn run(
        &mut self,
        stopping: Option<&dyn StoppingCondition>,
    ) -> Result<TerminationReport, StateMachineError> {
        if self.state != RunState::Running {
            self.transition(RunState::Running)?;
        }
        info!(
            seed = self.config.seed,
            max_steps = self.config.max_steps,
            "run started"
        );

        let reason = loop {
            if let Some(condition) = stopping {
                if self.steps % self.config.stopping_check_interval == 0 && condition.is_met(self) {
                    break TerminationReason::StoppingConditionMet;
                }
            }
            if self.steps >= self.config.max_steps {
                break TerminationReason::StepCapReached;
            }
            if let Err(error) = self.step() {
                warn!(step = self.steps, %error, "run errored");
                break TerminationReason::Errored(error.kind());
            }
        };

        self.transition(RunState::Completed(reason))?;
        info!(
            steps = self.steps,
            %reason,
            groups = self.workspace.group_count(),
            conflicts = self.tally.conflicts,
            "run finished"
        );
        Ok(TerminationReport {
            steps_executed: self.steps,
            reason,
        })
    }

    /// Abort a run that has not started
    ///
    /// # Errors
    /// [`StateMachineError`] once the run is underway or finished
    pub fn abort(&mut self) -> Result<(), StateMachineError> {
        self.transition(RunState::Aborted)
    }

    fn transition(&mut self, to: RunState) -> Result<(), StateMachineError> {
        validate_transition(self.state, to)?;
        self.state = to;
        Ok(())
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state)
            .field("steps", &self.steps)
            .field("depth", &self.depth)
            .field("pending", &self.stream.len())
            .field("workspace", &self.workspace)
            .field("tally", &self.tally)
            .finish_non_exhaustive()
    }
}
