//! Run lifecycle
//!
//! `Created → Running → {Completed(reason) | Aborted}`. A run may also be
//! aborted before it starts. Terminal states have no outgoing transitions.

use crate::error::{ErrorKind, StateMachineError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The stopping condition held between two steps
    StoppingConditionMet,
    /// `max_steps` steps were taken
    StepCapReached,
    /// A family failed with something other than a conflict
    Errored(ErrorKind),
}

impl TerminationReason {
    /// Whether the run reached its goal
    #[inline]
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::StoppingConditionMet)
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoppingConditionMet => f.write_str("stopping_condition_met"),
            Self::StepCapReached => f.write_str("step_cap_reached"),
            Self::Errored(kind) => write!(f, "errored({kind})"),
        }
    }
}

/// Lifecycle state of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// Built, not yet stepped
    Created,
    /// Stepping
    Running,
    /// Finished with a reason
    Completed(TerminationReason),
    /// Stopped before the first step
    Aborted,
}

/// Payload-free view of [`RunState`] used by the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// See [`RunState::Created`]
    Created,
    /// See [`RunState::Running`]
    Running,
    /// See [`RunState::Completed`]
    Completed,
    /// See [`RunState::Aborted`]
    Aborted,
}

impl RunState {
    /// Phase of this state
    #[must_use]
    pub fn phase(self) -> RunPhase {
        match self {
            Self::Created => RunPhase::Created,
            Self::Running => RunPhase::Running,
            Self::Completed(_) => RunPhase::Completed,
            Self::Aborted => RunPhase::Aborted,
        }
    }

    /// Whether no further transitions are possible
    #[must_use]
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self.phase()).is_empty()
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Running => f.write_str("running"),
            Self::Completed(reason) => write!(f, "completed({reason})"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

/// Phases reachable in one transition from `from`
#[must_use]
pub fn allowed_transitions(from: RunPhase) -> Vec<RunPhase> {
    use RunPhase::{Aborted, Completed, Created, Running};
    match from {
        Created => vec![Running, Aborted],
        Running => vec![Completed],
        Completed | Aborted => vec![],
    }
}

/// Validate a transition
///
/// # Errors
/// [`StateMachineError::IllegalTransition`] when `to` is not reachable from `from`
pub fn validate_transition(from: RunState, to: RunState) -> Result<(), StateMachineError> {
    if allowed_transitions(from.phase()).contains(&to.phase()) {
        Ok(())
    } else {
        Err(StateMachineError::IllegalTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_lifecycle() {
        assert!(validate_transition(RunState::Created, RunState::Running).is_ok());
        assert!(validate_transition(
            RunState::Running,
            RunState::Completed(TerminationReason::StepCapReached)
        )
        .is_ok());
        assert!(validate_transition(RunState::Created, RunState::Aborted).is_ok());
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let done = RunState::Completed(TerminationReason::StoppingConditionMet);
        assert!(validate_transition(done, RunState::Running).is_err());
        assert!(validate_transition(RunState::Created, done).is_err());
        assert!(validate_transition(RunState::Running, RunState::Created).is_err());
        assert!(validate_transition(RunState::Aborted, RunState::Running).is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(RunState::Aborted.is_terminal());
        assert!(RunState::Completed(TerminationReason::StepCapReached).is_terminal());
        assert!(!RunState::Running.is_terminal());
    }

    #[test]
    fn only_stopping_condition_counts_as_success() {
        assert!(TerminationReason::StoppingConditionMet.is_success());
        assert!(!TerminationReason::StepCapReached.is_success());
        assert!(!TerminationReason::Errored(ErrorKind::FamilyFailed).is_success());
    }
}
