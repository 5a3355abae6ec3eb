//! Codelets: small units of work drawn stochastically from the stream
//!
//! A [`Codelet`] names a family, carries an immutable [`Arguments`] map and
//! a strictly positive [`Urgency`] that sets its draw weight.

use crate::error::FamilyError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use weft_workspace::{Category, Focusable, Group, ItemId, Relation, Span};

/// Name of a codelet family
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FamilyId(Arc<str>);

impl FamilyId {
    /// Family name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FamilyId {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl From<String> for FamilyId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl Display for FamilyId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Urgency must be finite and strictly positive
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("invalid urgency {0}: must be finite and > 0")]
pub struct UrgencyError(pub f64);

/// Relative draw weight of a codelet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Urgency(f64);

impl Urgency {
    /// Weight used by routine and follow-up codelets
    pub const NORMAL: Urgency = Urgency(1.0);

    /// Create an urgency
    ///
    /// # Errors
    /// Returns [`UrgencyError`] for zero, negative, NaN or infinite values
    pub fn new(value: f64) -> Result<Self, UrgencyError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(UrgencyError(value))
        }
    }

    /// Raw weight
    #[inline]
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Urgency {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Urgency::new(value).map_err(serde::de::Error::custom)
    }
}

/// A single argument value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgValue {
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// Free text
    Text(String),
    /// Workspace item
    Item(ItemId),
    /// Item or group to focus on
    Focus(Focusable),
    /// Category label
    Category(Category),
    /// Position range
    Span(Span),
    /// Group value
    Group(Group),
    /// Relation value
    Relation(Relation),
}

/// Immutable name-to-value argument map
///
/// Built once with [`Arguments::with`]; cloning shares the underlying map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arguments(Arc<BTreeMap<String, ArgValue>>);

macro_rules! typed_getter {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty, $kind:literal) => {
        $(#[$doc])*
        ///
        /// # Errors
        /// [`FamilyError::MissingArgument`] or [`FamilyError::ArgumentType`]
        pub fn $name(&self, key: &str) -> Result<$ty, FamilyError> {
            match self.require(key)? {
                ArgValue::$variant(value) => Ok(value.clone()),
                _ => Err(FamilyError::ArgumentType {
                    name: key.to_string(),
                    expected: $kind,
                }),
            }
        }
    };
}

impl Arguments {
    /// Empty argument map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with `key` set to `value`
    #[must_use]
    pub fn with(self, key: impl Into<String>, value: ArgValue) -> Self {
        let mut map = Arc::try_unwrap(self.0).unwrap_or_else(|shared| (*shared).clone());
        map.insert(key.into(), value);
        Self(Arc::new(map))
    }

    /// Raw lookup
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.0.get(key)
    }

    /// Number of arguments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no arguments
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn require(&self, key: &str) -> Result<&ArgValue, FamilyError> {
        self.0
            .get(key)
            .ok_or_else(|| FamilyError::MissingArgument(key.to_string()))
    }

    typed_getter!(
        /// Integer argument
        int, Int, i64, "int"
    );
    typed_getter!(
        /// Float argument
        float, Float, f64, "float"
    );
    typed_getter!(
        /// Text argument
        text, Text, String, "text"
    );
    typed_getter!(
        /// Item argument
        item, Item, ItemId, "item"
    );
    typed_getter!(
        /// Focus target argument
        focus, Focus, Focusable, "focus"
    );
    typed_getter!(
        /// Category argument
        category, Category, Category, "category"
    );
    typed_getter!(
        /// Span argument
        span, Span, Span, "span"
    );
    typed_getter!(
        /// Group argument
        group, Group, Group, "group"
    );
    typed_getter!(
        /// Relation argument
        relation, Relation, Relation, "relation"
    );
}

impl FromIterator<(String, ArgValue)> for Arguments {
    fn from_iter<T: IntoIterator<Item = (String, ArgValue)>>(iter: T) -> Self {
        Self(Arc::new(iter.into_iter().collect()))
    }
}

/// A unit of work: family, arguments, urgency
#[derive(Debug, Clone, PartialEq)]
pub struct Codelet {
    family: FamilyId,
    arguments: Arguments,
    urgency: Urgency,
}

impl Codelet {
    /// Create a codelet
    #[must_use]
    pub fn new(family: impl Into<FamilyId>, arguments: Arguments, urgency: Urgency) -> Self {
        Self {
            family: family.into(),
            arguments,
            urgency,
        }
    }

    /// Family that runs this codelet
    #[inline]
    #[must_use]
    pub fn family(&self) -> &FamilyId {
        &self.family
    }

    /// Bound arguments
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Draw weight
    #[inline]
    #[must_use]
    pub fn urgency(&self) -> Urgency {
        self.urgency
    }
}

impl Display for Codelet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}(u={})", self.family, self.urgency.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgency_rejects_non_positive_and_non_finite() {
        assert!(Urgency::new(0.0).is_err());
        assert!(Urgency::new(-1.0).is_err());
        assert!(Urgency::new(f64::NAN).is_err());
        assert!(Urgency::new(f64::INFINITY).is_err());
        assert_eq!(Urgency::new(2.5).map(Urgency::get), Ok(2.5));
    }

    #[test]
    fn typed_getters_report_missing_and_mismatched() {
        let args = Arguments::new()
            .with("item", ArgValue::Item(ItemId(3)))
            .with("label", ArgValue::Text("x".into()));

        assert_eq!(args.item("item"), Ok(ItemId(3)));
        assert_eq!(
            args.relation("relation"),
            Err(FamilyError::MissingArgument("relation".into()))
        );
        assert_eq!(
            args.int("label"),
            Err(FamilyError::ArgumentType {
                name: "label".into(),
                expected: "int"
            })
        );
    }

    #[test]
    fn with_does_not_alter_shared_copies() {
        let base = Arguments::new().with("a", ArgValue::Int(1));
        let shared = base.clone();
        let extended = base.with("b", ArgValue::Int(2));

        assert_eq!(shared.len(), 1);
        assert_eq!(extended.len(), 2);
    }
}
