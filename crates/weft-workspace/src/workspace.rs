//! The shared structure a run builds
//!
//! A [`Workspace`] owns the items, relations and groups of one run and
//! enforces the structural invariant:
//!
//! - **No overlap**: no two present groups share a position. A proposal that
//!   overlaps anything is refused with a [`StructuralConflict`] listing every
//!   incumbent it collides with; the workspace is left untouched.
//! - **All or nothing**: a group is either fully present or fully absent.
//!
//! Storage uses persistent maps, so `clone()` is a cheap structural-sharing
//! snapshot. Subspaces rely on this to work on a private copy.

use crate::group::{Group, GroupId};
use crate::item::{Category, Focusable, Item, ItemId};
use crate::relation::Relation;
use crate::span::{Span, SpanPredicate};
use std::fmt;

/// A proposed group overlaps groups that are already present
///
/// Carries the refused proposal and the full incumbent list, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("group {proposal} conflicts with {} incumbent group(s)", .incumbents.len())]
pub struct StructuralConflict {
    proposal: Group,
    incumbents: Vec<(GroupId, Group)>,
}

impl StructuralConflict {
    pub(crate) fn new(proposal: Group, incumbents: Vec<(GroupId, Group)>) -> Self {
        Self {
            proposal,
            incumbents,
        }
    }

    /// The refused proposal
    #[inline]
    #[must_use]
    pub fn proposal(&self) -> &Group {
        &self.proposal
    }

    /// Overlapping incumbents, ordered by id
    #[inline]
    #[must_use]
    pub fn incumbents(&self) -> &[(GroupId, Group)] {
        &self.incumbents
    }

    /// Ids of the overlapping incumbents
    #[must_use]
    pub fn incumbent_ids(&self) -> Vec<GroupId> {
        self.incumbents.iter().map(|(id, _)| *id).collect()
    }

    /// Split into proposal and incumbents
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (Group, Vec<(GroupId, Group)>) {
        (self.proposal, self.incumbents)
    }
}

/// Workspace lookup and invariant errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkspaceError {
    /// No item at this position
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),

    /// Two present groups overlap
    #[error("invariant violated: {first} overlaps {second}")]
    Overlap {
        /// Group with the earlier start
        first: GroupId,
        /// Group overlapping it
        second: GroupId,
    },
}

/// Items, relations and groups of one run
#[derive(Clone, Default)]
pub struct Workspace {
    items: im::Vector<Item>,
    relations: im::Vector<Relation>,
    groups: im::OrdMap<GroupId, Group>,
    next_group: u64,
    focus: Option<Focusable>,
    focus_history: im::Vector<Focusable>,
}

impl Workspace {
    /// Create an empty workspace
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a workspace holding one item per value, positions `0..n`
    #[must_use]
    pub fn with_items(values: impl IntoIterator<Item = i64>) -> Self {
        let mut ws = Self::new();
        for value in values {
            ws.add_item(value);
        }
        ws
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    /// Append an item and return its position
    pub fn add_item(&mut self, value: i64) -> ItemId {
        let id = ItemId(self.items.len());
        self.items.push_back(Item::new(id, value));
        id
    }

    /// Item at a position
    #[inline]
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.0)
    }

    /// All items in position order
    #[inline]
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Number of items
    #[inline]
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Describe an item as belonging to a category
    ///
    /// Returns `false` when the item was already known as an instance.
    ///
    /// # Errors
    /// Returns [`WorkspaceError::UnknownItem`] for an invalid position
    pub fn describe_as(&mut self, id: ItemId, category: Category) -> Result<bool, WorkspaceError> {
        let item = self
            .items
            .get_mut(id.0)
            .ok_or(WorkspaceError::UnknownItem(id))?;
        Ok(item.describe_as(category))
    }

    // ------------------------------------------------------------------
    // Relations
    // ------------------------------------------------------------------

    /// Record a relation
    pub fn add_relation(&mut self, relation: Relation) {
        tracing::trace!(%relation, "relation added");
        self.relations.push_back(relation);
    }

    /// All recorded relations, oldest first
    #[inline]
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }

    /// Number of recorded relations
    #[inline]
    #[must_use]
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Insert a group unless it overlaps a present one
    ///
    /// # Errors
    /// Returns [`StructuralConflict`] carrying every overlapping incumbent;
    /// nothing is inserted in that case
    pub fn insert_group(&mut self, group: Group) -> Result<GroupId, StructuralConflict> {
        let incumbents = self.overlapping(group.span());
        if !incumbents.is_empty() {
            tracing::debug!(proposal = %group, incumbents = incumbents.len(), "group refused");
            return Err(StructuralConflict {
                proposal: group,
                incumbents,
            });
        }

        Ok(self.insert_unchecked(group))
    }

    /// Caller guarantees the group overlaps nothing present
    pub(crate) fn insert_unchecked(&mut self, group: Group) -> GroupId {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        tracing::debug!(%id, group = %group, "group inserted");
        self.groups.insert(id, group);
        id
    }

    /// Remove a present group
    ///
    /// Clears the current focus if it pointed at the removed group.
    pub fn remove_group(&mut self, id: GroupId) -> Option<Group> {
        let removed = self.groups.remove(&id);
        if removed.is_some() {
            tracing::debug!(%id, "group removed");
            if self.focus == Some(Focusable::Group(id)) {
                self.focus = None;
            }
        }
        removed
    }

    /// Present groups overlapping `span`, ordered by id
    #[must_use]
    pub fn overlapping(&self, span: Span) -> Vec<(GroupId, Group)> {
        self.groups
            .iter()
            .filter(|(_, g)| g.span().overlaps(&span))
            .map(|(id, g)| (*id, g.clone()))
            .collect()
    }

    /// Present groups whose start and end satisfy the given predicates
    ///
    /// `groups_with_span(LessThanEq(l), GreaterThanEq(r))` yields exactly
    /// the groups covering `[l, r]`.
    pub fn groups_with_span(
        &self,
        start: SpanPredicate,
        end: SpanPredicate,
    ) -> impl Iterator<Item = (GroupId, &Group)> {
        self.groups
            .iter()
            .filter(move |(_, g)| start.matches(g.span().start()) && end.matches(g.span().end()))
            .map(|(id, g)| (*id, g))
    }

    /// Present group by id
    #[inline]
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// All present groups, ordered by id
    #[inline]
    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &Group)> {
        self.groups.iter().map(|(id, g)| (*id, g))
    }

    /// Number of present groups
    #[inline]
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Verify no two present groups overlap
    ///
    /// # Errors
    /// Returns the first overlapping pair found
    pub fn check_invariants(&self) -> Result<(), WorkspaceError> {
        let mut by_start: Vec<(Span, GroupId)> =
            self.groups.iter().map(|(id, g)| (g.span(), *id)).collect();
        by_start.sort();
        for pair in by_start.windows(2) {
            let ((a_span, a), (b_span, b)) = (pair[0], pair[1]);
            if a_span.overlaps(&b_span) {
                return Err(WorkspaceError::Overlap {
                    first: a,
                    second: b,
                });
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    /// Record attentional focus; never fails, never touches groups
    pub fn focus_on(&mut self, target: Focusable) {
        tracing::trace!(%target, "focus");
        self.focus = Some(target);
        self.focus_history.push_back(target);
    }

    /// Current focus
    #[inline]
    #[must_use]
    pub fn focus(&self) -> Option<Focusable> {
        self.focus
    }

    /// Every focus target so far, oldest first
    #[inline]
    pub fn focus_history(&self) -> impl Iterator<Item = &Focusable> {
        self.focus_history.iter()
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("items", &self.items.len())
            .field("relations", &self.relations.len())
            .field("groups", &self.groups)
            .field("focus", &self.focus)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::Mapping;
    use pretty_assertions::assert_eq;

    fn group(start: usize, end: usize) -> Group {
        Group::new(Span::new(start, end).unwrap(), Mapping::new("succ"))
    }

    #[test]
    fn insert_disjoint_groups() {
        let mut ws = Workspace::new();
        let a = ws.insert_group(group(0, 1)).unwrap();
        let b = ws.insert_group(group(2, 5)).unwrap();

        assert_ne!(a, b);
        assert_eq!(ws.group_count(), 2);
        assert!(ws.check_invariants().is_ok());
    }

    #[test]
    fn nested_proposal_conflicts_with_incumbent() {
        let mut ws = Workspace::new();
        let outer = ws.insert_group(group(2, 5)).unwrap();

        let conflict = ws.insert_group(group(3, 4)).unwrap_err();

        assert_eq!(conflict.incumbents(), &[(outer, group(2, 5))]);
        assert_eq!(conflict.proposal(), &group(3, 4));
        assert_eq!(ws.group_count(), 1);
    }

    #[test]
    fn conflict_lists_every_incumbent() {
        let mut ws = Workspace::new();
        let a = ws.insert_group(group(0, 2)).unwrap();
        let _far = ws.insert_group(group(8, 9)).unwrap();
        let b = ws.insert_group(group(4, 5)).unwrap();

        let conflict = ws.insert_group(group(1, 4)).unwrap_err();
        assert_eq!(conflict.incumbent_ids(), vec![a, b]);
    }

    #[test]
    fn groups_with_span_finds_dominating_group() {
        let mut ws = Workspace::new();
        let outer = ws.insert_group(group(2, 5)).unwrap();
        ws.insert_group(group(7, 8)).unwrap();

        let found: Vec<GroupId> = ws
            .groups_with_span(SpanPredicate::LessThanEq(3), SpanPredicate::GreaterThanEq(4))
            .map(|(id, _)| id)
            .collect();
        assert_eq!(found, vec![outer]);
    }

    #[test]
    fn remove_group_clears_focus_on_it() {
        let mut ws = Workspace::new();
        let id = ws.insert_group(group(0, 3)).unwrap();
        ws.focus_on(Focusable::Group(id));

        assert_eq!(ws.remove_group(id), Some(group(0, 3)));
        assert_eq!(ws.focus(), None);
        assert_eq!(ws.focus_history().count(), 1);
        assert!(ws.remove_group(id).is_none());
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut ws = Workspace::new();
        let a = ws.insert_group(group(0, 1)).unwrap();
        ws.remove_group(a);
        let b = ws.insert_group(group(0, 1)).unwrap();
        assert!(b > a);
    }

    #[test]
    fn snapshot_is_isolated() {
        let mut ws = Workspace::with_items([1, 2, 3]);
        ws.insert_group(group(0, 1)).unwrap();

        let mut copy = ws.clone();
        copy.insert_group(group(2, 2)).unwrap();
        copy.describe_as(ItemId(0), Category::new("odd")).unwrap();

        assert_eq!(ws.group_count(), 1);
        assert_eq!(copy.group_count(), 2);
        assert!(!ws.item(ItemId(0)).unwrap().is_instance_of(&Category::new("odd")));
    }

    #[test]
    fn describe_as_reports_new_knowledge() {
        let mut ws = Workspace::with_items([4]);
        let even = Category::new("even");

        assert_eq!(ws.describe_as(ItemId(0), even.clone()), Ok(true));
        assert_eq!(ws.describe_as(ItemId(0), even), Ok(false));
        assert_eq!(
            ws.describe_as(ItemId(3), Category::new("x")),
            Err(WorkspaceError::UnknownItem(ItemId(3)))
        );
    }
}
