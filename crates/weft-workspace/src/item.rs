//! Workspace items and the things attention can focus on

use crate::group::GroupId;
use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Position of an item in the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub usize);

impl ItemId {
    /// Span covering just this item
    #[inline]
    #[must_use]
    pub const fn span(self) -> Span {
        Span::point(self.0)
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Named category an item can be described as
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Category(String);

impl Category {
    /// Create a category from its name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Category name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One input element
///
/// The value never changes; the set of categories only grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    value: i64,
    categories: BTreeSet<Category>,
}

impl Item {
    pub(crate) fn new(id: ItemId, value: i64) -> Self {
        Self {
            id,
            value,
            categories: BTreeSet::new(),
        }
    }

    /// Item position
    #[inline]
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Item value
    #[inline]
    #[must_use]
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Categories this item has been described as
    #[inline]
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// Whether the item is already known as an instance of `category`
    #[inline]
    #[must_use]
    pub fn is_instance_of(&self, category: &Category) -> bool {
        self.categories.contains(category)
    }

    /// Returns `false` if the category was already known
    pub(crate) fn describe_as(&mut self, category: Category) -> bool {
        self.categories.insert(category)
    }
}

/// Target of attentional focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Focusable {
    /// A single item
    Item(ItemId),
    /// A present group
    Group(GroupId),
}

impl Display for Focusable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item(id) => write!(f, "{id}"),
            Self::Group(id) => write!(f, "{id}"),
        }
    }
}
