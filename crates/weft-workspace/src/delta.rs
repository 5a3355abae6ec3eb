//! Atomic group edits
//!
//! A [`WorkspaceDelta`] bundles group removals and insertions. Applying it is
//! all-or-nothing: the whole delta is checked against the state the workspace
//! would have after the removals, and only then is anything mutated.

use crate::group::{Group, GroupId};
use crate::workspace::{StructuralConflict, Workspace};
use std::collections::BTreeSet;

/// Errors from applying a delta; the workspace is unchanged in every case
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeltaError {
    /// A removal names a group that is not present
    #[error("cannot remove {0}: not present")]
    UnknownGroup(GroupId),

    /// An insertion would overlap a group that survives the removals
    #[error("delta would violate non-overlap: {0}")]
    Conflict(#[from] StructuralConflict),

    /// Two insertions of the same delta overlap each other
    #[error("co-inserted groups overlap: {first} and {second}")]
    OverlappingInsertions {
        /// Earlier insertion
        first: Group,
        /// Later insertion overlapping it
        second: Group,
    },
}

/// Set of group removals followed by insertions, applied atomically
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceDelta {
    removals: Vec<GroupId>,
    insertions: Vec<Group>,
}

impl WorkspaceDelta {
    /// Empty delta
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta that supersedes `incumbents` with `proposal`
    #[must_use]
    pub fn replace(incumbents: impl IntoIterator<Item = GroupId>, proposal: Group) -> Self {
        Self {
            removals: incumbents.into_iter().collect(),
            insertions: vec![proposal],
        }
    }

    /// Add a removal
    #[inline]
    #[must_use]
    pub fn remove(mut self, id: GroupId) -> Self {
        self.removals.push(id);
        self
    }

    /// Add an insertion
    #[inline]
    #[must_use]
    pub fn insert(mut self, group: Group) -> Self {
        self.insertions.push(group);
        self
    }

    /// Groups to remove
    #[inline]
    #[must_use]
    pub fn removals(&self) -> &[GroupId] {
        &self.removals
    }

    /// Groups to insert
    #[inline]
    #[must_use]
    pub fn insertions(&self) -> &[Group] {
        &self.insertions
    }

    /// True when the delta changes nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.insertions.is_empty()
    }
}

impl Workspace {
    /// Apply a delta atomically, returning the ids of inserted groups
    ///
    /// # Errors
    /// - [`DeltaError::UnknownGroup`] if a removal is not present
    /// - [`DeltaError::Conflict`] if an insertion overlaps a group that
    ///   survives the removals
    /// - [`DeltaError::OverlappingInsertions`] if two insertions overlap
    pub fn apply(&mut self, delta: WorkspaceDelta) -> Result<Vec<GroupId>, DeltaError> {
        let removed: BTreeSet<GroupId> = delta.removals.iter().copied().collect();
        if let Some(missing) = removed.iter().find(|id| self.group(**id).is_none()) {
            return Err(DeltaError::UnknownGroup(*missing));
        }

        for (index, group) in delta.insertions.iter().enumerate() {
            let incumbents: Vec<(GroupId, Group)> = self
                .overlapping(group.span())
                .into_iter()
                .filter(|(id, _)| !removed.contains(id))
                .collect();
            if !incumbents.is_empty() {
                return Err(StructuralConflict::new(group.clone(), incumbents).into());
            }
            if let Some(other) = delta.insertions[..index]
                .iter()
                .find(|other| other.span().overlaps(&group.span()))
            {
                return Err(DeltaError::OverlappingInsertions {
                    first: other.clone(),
                    second: group.clone(),
                });
            }
        }

        for id in &delta.removals {
            self.remove_group(*id);
        }
        Ok(delta
            .insertions
            .into_iter()
            .map(|group| self.insert_unchecked(group))
            .collect())
    }
}
