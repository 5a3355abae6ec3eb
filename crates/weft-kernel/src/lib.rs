//! weft kernel
//!
//! Stochastic codelet scheduling over a shared [`weft_workspace::Workspace`]:
//! 1. **Stream**: pending codelets drawn with probability proportional to urgency
//! 2. **Controller**: step loop, stopping conditions, run lifecycle
//! 3. **Subspaces**: isolated, bounded adjudication of structural conflicts,
//!    committed back atomically
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use weft_kernel::families::{self, FindRelation, SpanLengthAdjudicator};
//! use weft_kernel::prelude::*;
//! use weft_workspace::{ItemId, Workspace};
//!
//! let registry = Arc::new(families::builtin_registry());
//! let mut controller = Controller::new(EngineConfig::new().with_seed(7).with_max_steps(200), registry)
//!     .unwrap()
//!     .with_workspace(Workspace::with_items([1, 2, 3, 4]))
//!     .with_adjudicator(Arc::new(SpanLengthAdjudicator::default()));
//! for i in 0..4 {
//!     controller.insert(FindRelation::codelet(ItemId(i), Urgency::NORMAL));
//! }
//!
//! let report = controller.run(None).unwrap();
//! assert!(report.steps_executed <= 200);
//! assert!(controller.workspace().check_invariants().is_ok());
//! ```

pub mod codelet;
pub mod config;
pub mod controller;
pub mod error;
pub mod families;
pub mod family;
pub mod state_machine;
pub mod stopping;
pub mod stream;
pub mod subspace;

pub use codelet::{ArgValue, Arguments, Codelet, FamilyId, Urgency, UrgencyError};
pub use config::EngineConfig;
pub use controller::{Controller, ResolutionTally, TerminationReport};
pub use error::{ConfigError, ErrorKind, FamilyError, StateMachineError};
pub use family::{Family, FamilyRegistry};
pub use state_machine::{RunState, TerminationReason};
pub use stopping::{StoppingCondition, StoppingConditionRegistry};
pub use stream::{DrawError, Stream};
pub use subspace::{Adjudicator, Contest, DeclaredVerdict, Outcome, Verdict};

/// Common imports for family authors and drivers
pub mod prelude {
    pub use crate::codelet::{ArgValue, Arguments, Codelet, Urgency};
    pub use crate::config::EngineConfig;
    pub use crate::controller::{Controller, TerminationReport};
    pub use crate::error::FamilyError;
    pub use crate::family::{Family, FamilyRegistry};
    pub use crate::state_machine::TerminationReason;
    pub use crate::stopping::StoppingCondition;
    pub use crate::subspace::{Adjudicator, Contest, Outcome, Verdict};
}
