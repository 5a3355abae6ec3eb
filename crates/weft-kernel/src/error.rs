//! Error types for the codelet kernel

use crate::codelet::UrgencyError;
use crate::stream::DrawError;
use serde::{Deserialize, Serialize};
use weft_workspace::{DeltaError, StructuralConflict, WorkspaceError};

/// Failure raised by a codelet family while it runs
///
/// [`FamilyError::Conflict`] is special: the controller intercepts it and
/// starts a subspace instead of aborting the run. Every other variant
/// propagates out of [`Controller::step`](crate::Controller::step).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FamilyError {
    /// A proposed group overlapped present groups
    #[error("structural conflict: {0}")]
    Conflict(#[from] StructuralConflict),

    /// Codelet names a family the registry does not know
    #[error("unknown family: {0}")]
    UnknownFamily(String),

    /// Required argument is absent
    #[error("missing argument: {0}")]
    MissingArgument(String),

    /// Argument present but of the wrong kind
    #[error("argument {name} is not a {expected}")]
    ArgumentType {
        /// Argument name
        name: String,
        /// Expected value kind
        expected: &'static str,
    },

    /// Workspace lookup failed
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// Committing a resolution failed
    #[error(transparent)]
    Delta(#[from] DeltaError),

    /// Follow-up codelet had an invalid urgency
    #[error(transparent)]
    Urgency(#[from] UrgencyError),

    /// Family-specific failure
    #[error("family failed: {0}")]
    Failed(String),

    /// Stream could not draw the next codelet
    #[error(transparent)]
    Draw(#[from] DrawError),
}

impl FamilyError {
    /// Coarse classification recorded in termination reports
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownFamily(_) => ErrorKind::UnknownFamily,
            Self::MissingArgument(_) => ErrorKind::MissingArgument,
            Self::ArgumentType { .. } => ErrorKind::ArgumentType,
            Self::Conflict(_)
            | Self::Workspace(_)
            | Self::Delta(_)
            | Self::Urgency(_)
            | Self::Draw(_)
            | Self::Failed(_) => ErrorKind::FamilyFailed,
        }
    }

    /// Structural conflicts are resolved by the controller, never surfaced
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Error classification carried by [`TerminationReason::Errored`](crate::TerminationReason::Errored)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Codelet named an unregistered family
    UnknownFamily,
    /// Required argument absent
    MissingArgument,
    /// Argument of the wrong kind
    ArgumentType,
    /// Any other family failure
    FamilyFailed,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::UnknownFamily => "unknown_family",
            Self::MissingArgument => "missing_argument",
            Self::ArgumentType => "argument_type",
            Self::FamilyFailed => "family_failed",
        };
        f.write_str(name)
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Stopping condition name is not registered
    #[error("unknown stopping condition '{name}' (known: {})", known.join(", "))]
    UnknownStoppingCondition {
        /// Name that was asked for
        name: String,
        /// Registered names
        known: Vec<String>,
    },

    /// Neither a scenario nor an input was given
    #[error("missing input specification: {0}")]
    MissingInputSpecification(String),

    /// A setting is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Illegal run lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateMachineError {
    /// Transition not in the lifecycle table
    #[error("illegal run transition: {from} -> {to}")]
    IllegalTransition {
        /// Current state
        from: String,
        /// Requested state
        to: String,
    },
}
