//! Stopping conditions for the built-in families

use crate::controller::Controller;
use crate::stopping::StoppingConditionRegistry;
use weft_workspace::SpanPredicate;

/// Every item is covered by some group
pub const FULLY_GROUPED: &str = "fully_grouped";
/// One group covers every item
pub const SINGLE_GROUP: &str = "single_group";

fn fully_grouped(controller: &Controller) -> bool {
    let ws = controller.workspace();
    ws.item_count() > 0
        && ws.items().all(|item| {
            let position = item.id().0;
            ws.groups_with_span(
                SpanPredicate::LessThanEq(position),
                SpanPredicate::GreaterThanEq(position),
            )
            .next()
            .is_some()
        })
}

fn single_group(controller: &Controller) -> bool {
    let ws = controller.workspace();
    let count = ws.item_count();
    count > 0
        && ws
            .groups_with_span(SpanPredicate::Eq(0), SpanPredicate::Eq(count - 1))
            .next()
            .is_some()
}

/// Registry of the built-in stopping conditions
#[must_use]
pub fn builtin_stopping_conditions() -> StoppingConditionRegistry {
    let mut registry = StoppingConditionRegistry::new();
    registry.register(FULLY_GROUPED, fully_grouped);
    registry.register(SINGLE_GROUP, single_group);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::family::FamilyRegistry;
    use std::sync::Arc;
    use weft_workspace::{Group, Mapping, Span, Workspace};

    fn controller(groups: &[(usize, usize)]) -> Controller {
        let mut c = Controller::new(EngineConfig::default(), Arc::new(FamilyRegistry::new()))
            .unwrap()
            .with_workspace(Workspace::with_items([1, 2, 3, 4]));
        for &(s, e) in groups {
            c.workspace_mut()
                .insert_group(Group::new(Span::new(s, e).unwrap(), Mapping::new("succ")))
                .unwrap();
        }
        c
    }

    #[test]
    fn fully_grouped_needs_every_position() {
        assert!(!fully_grouped(&controller(&[(0, 1)])));
        assert!(fully_grouped(&controller(&[(0, 1), (2, 3)])));
    }

    #[test]
    fn single_group_needs_whole_span() {
        assert!(!single_group(&controller(&[(0, 1), (2, 3)])));
        assert!(single_group(&controller(&[(0, 3)])));
    }

    #[test]
    fn empty_workspace_never_stops() {
        let c = Controller::new(EngineConfig::default(), Arc::new(FamilyRegistry::new())).unwrap();
        assert!(!fully_grouped(&c));
        assert!(!single_group(&c));
    }

    #[test]
    fn registry_knows_both() {
        let registry = builtin_stopping_conditions();
        assert_eq!(registry.names(), vec![FULLY_GROUPED, SINGLE_GROUP]);
    }
}
