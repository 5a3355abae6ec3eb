//! Relation discovery and group construction

use super::{FocusOn, GROUP_FROM_RELATION};
use crate::codelet::{ArgValue, Arguments, Codelet, Urgency};
use crate::controller::Controller;
use crate::error::FamilyError;
use crate::family::Family;
use tracing::trace;
use weft_workspace::{
    Endpoint, Focusable, Group, ItemId, Mapping, Relation, SpanPredicate, WorkspaceError,
};

/// Mapping linking two neighbouring values, if any
#[must_use]
pub fn mapping_between(left: i64, right: i64) -> Option<Mapping> {
    match right.checked_sub(left)? {
        0 => Some(Mapping::new("same")),
        1 => Some(Mapping::new("succ")),
        -1 => Some(Mapping::new("pred")),
        _ => None,
    }
}

/// Relates `item` to its right neighbour
///
/// When a group with the same mapping already ends at `item`, the relation
/// starts at that group instead, so accepting it would grow the group.
/// Posts a `group_from_relation` codelet for the new relation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindRelation;

impl FindRelation {
    /// Codelet scouting from `item`
    #[must_use]
    pub fn codelet(item: ItemId, urgency: Urgency) -> Codelet {
        Codelet::new(
            super::FIND_RELATION,
            Arguments::new().with("item", ArgValue::Item(item)),
            urgency,
        )
    }
}

impl Family for FindRelation {
    fn run(&self, controller: &mut Controller, args: &Arguments) -> Result<(), FamilyError> {
        let left = args.item("item")?;
        let ws = controller.workspace();

        let left_value = ws
            .item(left)
            .ok_or(WorkspaceError::UnknownItem(left))?
            .value();
        let Some(right) = left.0.checked_add(1).map(ItemId) else {
            return Ok(());
        };
        let Some(right_value) = ws.item(right).map(weft_workspace::Item::value) else {
            return Ok(());
        };
        let Some(mapping) = mapping_between(left_value, right_value) else {
            return Ok(());
        };

        let first = ws
            .groups_with_span(SpanPredicate::Any, SpanPredicate::Eq(left.0))
            .find(|(_, group)| group.mapping() == &mapping)
            .map_or_else(
                || Endpoint::new(Focusable::Item(left), left.span()),
                |(id, group)| Endpoint::new(Focusable::Group(id), group.span()),
            );
        let second = Endpoint::new(Focusable::Item(right), right.span());
        let relation =
            Relation::new(first, second, mapping).map_err(|e| FamilyError::Failed(e.to_string()))?;

        trace!(%relation, "relation found");
        controller.workspace_mut().add_relation(relation.clone());
        controller.insert(GroupFromRelation::codelet(relation, Urgency::NORMAL));
        Ok(())
    }
}

/// Builds a group from `relation` unless one already spans it
///
/// Overlap with present groups surfaces as [`FamilyError::Conflict`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupFromRelation;

impl GroupFromRelation {
    /// Codelet proposing the group for `relation`
    #[must_use]
    pub fn codelet(relation: Relation, urgency: Urgency) -> Codelet {
        Codelet::new(
            GROUP_FROM_RELATION,
            Arguments::new().with("relation", ArgValue::Relation(relation)),
            urgency,
        )
    }
}

impl Family for GroupFromRelation {
    fn run(&self, controller: &mut Controller, args: &Arguments) -> Result<(), FamilyError> {
        let relation = args.relation("relation")?;
        let start = relation.first().span().start();
        let end = relation.second().span().end();

        let dominated = controller
            .workspace()
            .groups_with_span(SpanPredicate::LessThanEq(start), SpanPredicate::GreaterThanEq(end))
            .next()
            .is_some();
        if dominated {
            return Ok(());
        }

        let id = controller
            .workspace_mut()
            .insert_group(Group::from_relation(&relation))?;
        controller.insert(FocusOn::codelet(Focusable::Group(id), Urgency::NORMAL));
        Ok(())
    }
}
