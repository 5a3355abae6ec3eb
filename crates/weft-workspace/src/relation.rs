//! Relations between two workspace entities
//!
//! A [`Relation`] links a first and a second [`Endpoint`] through a
//! [`Mapping`]. Relations are the raw material groups are built from.

use crate::item::Focusable;
use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Transformation linking the two ends of a relation (e.g. `succ`, `same`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Mapping(String);

impl Mapping {
    /// Create a mapping from its name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Mapping name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for Mapping {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One end of a relation together with the positions it covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    target: Focusable,
    span: Span,
}

impl Endpoint {
    /// Create an endpoint
    #[inline]
    #[must_use]
    pub const fn new(target: Focusable, span: Span) -> Self {
        Self { target, span }
    }

    /// What this end refers to
    #[inline]
    #[must_use]
    pub const fn target(&self) -> Focusable {
        self.target
    }

    /// Positions covered by this end
    #[inline]
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }
}

/// Relation construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelationError {
    /// Second endpoint does not lie strictly after the first
    #[error("relation endpoints out of order: {first} then {second}")]
    OutOfOrder { first: Span, second: Span },
}

/// Immutable link between two endpoints
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    first: Endpoint,
    second: Endpoint,
    mapping: Mapping,
}

impl Relation {
    /// Create a relation
    ///
    /// # Errors
    /// Returns [`RelationError::OutOfOrder`] unless the second endpoint
    /// starts after the first one ends
    pub fn new(first: Endpoint, second: Endpoint, mapping: Mapping) -> Result<Self, RelationError> {
        if first.span.end() >= second.span.start() {
            return Err(RelationError::OutOfOrder {
                first: first.span,
                second: second.span,
            });
        }
        Ok(Self {
            first,
            second,
            mapping,
        })
    }

    /// First endpoint
    #[inline]
    #[must_use]
    pub fn first(&self) -> &Endpoint {
        &self.first
    }

    /// Second endpoint
    #[inline]
    #[must_use]
    pub fn second(&self) -> &Endpoint {
        &self.second
    }

    /// Mapping linking the endpoints
    #[inline]
    #[must_use]
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Span from the start of the first end to the end of the second
    #[inline]
    #[must_use]
    pub fn span(&self) -> Span {
        self.first.span.cover(&self.second.span)
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -{}-> {}",
            self.first.target, self.mapping, self.second.target
        )
    }
}
