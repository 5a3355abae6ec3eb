//! weft workspace
//!
//! The shared, structurally constrained state a codelet run builds.
//!
//! # Core Concepts
//!
//! - [`Workspace`]: items, relations and groups of one run, with the
//!   non-overlap invariant enforced on every insertion
//! - [`Group`]: an immutable structure spanning `[start, end]`
//! - [`StructuralConflict`]: the refusal returned when a proposal overlaps
//!   incumbents, carrying all of them
//! - [`WorkspaceDelta`]: atomic removal + insertion used to commit a
//!   conflict resolution
//! - [`SpanPredicate`]: comparison used by span queries
//!
//! # Example
//!
//! ```rust
//! use weft_workspace::{Group, Mapping, Span, SpanPredicate, Workspace};
//!
//! let mut ws = Workspace::with_items([1, 2, 3, 4, 5, 6]);
//! let outer = ws.insert_group(Group::new(Span::new(2, 5).unwrap(), Mapping::new("succ"))).unwrap();
//!
//! let conflict = ws
//!     .insert_group(Group::new(Span::new(3, 4).unwrap(), Mapping::new("same")))
//!     .unwrap_err();
//! assert_eq!(conflict.incumbent_ids(), vec![outer]);
//!
//! let covering = ws
//!     .groups_with_span(SpanPredicate::LessThanEq(3), SpanPredicate::GreaterThanEq(4))
//!     .count();
//! assert_eq!(covering, 1);
//! ```

#![warn(unreachable_pub)]

mod delta;
mod group;
mod item;
mod relation;
mod span;
mod workspace;

pub use delta::{DeltaError, WorkspaceDelta};
pub use group::{Group, GroupId};
pub use item::{Category, Focusable, Item, ItemId};
pub use relation::{Endpoint, Mapping, Relation, RelationError};
pub use span::{Span, SpanError, SpanPredicate};
pub use workspace::{StructuralConflict, Workspace, WorkspaceError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
