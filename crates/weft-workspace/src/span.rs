//! Inclusive position ranges and the comparison predicates used to query them
//!
//! Provides [`Span`] for addressing a contiguous range of items and
//! [`SpanPredicate`] for span queries against the workspace.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Inclusive range of item positions `[start, end]`
///
/// # Invariants
/// - `start <= end`
/// - Immutable after construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a new span
    ///
    /// # Errors
    /// Returns [`SpanError::Inverted`] if `start > end`
    #[inline]
    pub fn new(start: usize, end: usize) -> Result<Self, SpanError> {
        if start > end {
            return Err(SpanError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Span covering a single position
    #[inline]
    #[must_use]
    pub const fn point(position: usize) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Smallest span covering both `self` and `other`
    #[inline]
    #[must_use]
    pub fn cover(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// First covered position
    #[inline]
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Last covered position
    #[inline]
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Number of covered positions, saturating at `usize::MAX`
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        (self.end - self.start).saturating_add(1)
    }

    /// Spans are never empty; present for API symmetry with `len`
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// True when the two spans share at least one position
    #[inline]
    #[must_use]
    pub const fn overlaps(&self, other: &Span) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// True when `other` lies entirely inside `self`
    #[inline]
    #[must_use]
    pub const fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Span construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpanError {
    /// Start lies after end
    #[error("inverted span: start {start} > end {end}")]
    Inverted {
        /// Requested start
        start: usize,
        /// Requested end
        end: usize,
    },
}

/// Comparison applied to one end of a span
///
/// Used by [`crate::Workspace::groups_with_span`], e.g.
/// `(LessThanEq(l), GreaterThanEq(r))` finds groups covering `[l, r]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpanPredicate {
    /// Matches every position
    Any,
    /// `position == n`
    Eq(usize),
    /// `position < n`
    LessThan(usize),
    /// `position <= n`
    LessThanEq(usize),
    /// `position > n`
    GreaterThan(usize),
    /// `position >= n`
    GreaterThanEq(usize),
}

impl SpanPredicate {
    /// Evaluate the predicate against a position
    #[inline]
    #[must_use]
    pub const fn matches(self, position: usize) -> bool {
        match self {
            Self::Any => true,
            Self::Eq(n) => position == n,
            Self::LessThan(n) => position < n,
            Self::LessThanEq(n) => position <= n,
            Self::GreaterThan(n) => position > n,
            Self::GreaterThanEq(n) => position >= n,
        }
    }
}
