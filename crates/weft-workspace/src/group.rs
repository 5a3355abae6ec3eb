//! Groups: composite structures spanning a contiguous range

use crate::relation::{Mapping, Relation};
use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Workspace-assigned group identifier
///
/// Ids are handed out in insertion order and never reused within one
/// workspace lineage (a subspace snapshot continues its parent's counter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u64);

impl Display for GroupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// A group over `[start, end]` built from an underlying mapping
///
/// Immutable: replacing a group means removing it and inserting another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Group {
    span: Span,
    mapping: Mapping,
    relation: Option<Relation>,
}

impl Group {
    /// Create a group directly from a span and mapping
    #[inline]
    #[must_use]
    pub fn new(span: Span, mapping: Mapping) -> Self {
        Self {
            span,
            mapping,
            relation: None,
        }
    }

    /// Create the group a relation's two ends would form
    #[must_use]
    pub fn from_relation(relation: &Relation) -> Self {
        Self {
            span: relation.span(),
            mapping: relation.mapping().clone(),
            relation: Some(relation.clone()),
        }
    }

    /// Covered positions
    #[inline]
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Underlying mapping
    #[inline]
    #[must_use]
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Relation the group was built from, if any
    #[inline]
    #[must_use]
    pub fn relation(&self) -> Option<&Relation> {
        self.relation.as_ref()
    }
}

impl Display for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.mapping, self.span)
    }
}
