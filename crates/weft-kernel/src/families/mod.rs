//! Built-in codelet families
//!
//! A small example library over integer sequences. Items that differ by
//! 0 or ±1 are related (`same`, `succ`, `pred`), relations become groups,
//! and runs of a mapping grow by extending a group with its right
//! neighbour. The scheduler does not depend on any of this.
//!
//! | family                 | arguments            |
//! |------------------------|----------------------|
//! | `focus_on`             | `focus`              |
//! | `describe_as`          | `item`, `category`   |
//! | `find_relation`        | `item`               |
//! | `group_from_relation`  | `relation`           |
//! | `evaluate_alternative` | `side`, `strength`   |

mod adjudication;
mod conditions;
mod structure;

pub use adjudication::{EvaluateAlternative, Side, SpanLengthAdjudicator};
pub use conditions::{builtin_stopping_conditions, FULLY_GROUPED, SINGLE_GROUP};
pub use structure::{mapping_between, FindRelation, GroupFromRelation};

use crate::codelet::{ArgValue, Arguments, Codelet, Urgency};
use crate::controller::Controller;
use crate::error::FamilyError;
use crate::family::{Family, FamilyRegistry};
use weft_workspace::{Category, Focusable, ItemId};

/// Records attentional focus
pub const FOCUS_ON: &str = "focus_on";
/// Adds a category to an item
pub const DESCRIBE_AS: &str = "describe_as";
/// Relates an item to its right neighbour
pub const FIND_RELATION: &str = "find_relation";
/// Builds a group from a relation
pub const GROUP_FROM_RELATION: &str = "group_from_relation";
/// Scores one side of a contest
pub const EVALUATE_ALTERNATIVE: &str = "evaluate_alternative";

/// Register every built-in family
pub fn register_builtin(registry: &mut FamilyRegistry) {
    registry.register(FOCUS_ON, FocusOn);
    registry.register(DESCRIBE_AS, DescribeAs);
    registry.register(FIND_RELATION, FindRelation);
    registry.register(GROUP_FROM_RELATION, GroupFromRelation);
    registry.register(EVALUATE_ALTERNATIVE, EvaluateAlternative);
}

/// Registry holding only the built-in families
#[must_use]
pub fn builtin_registry() -> FamilyRegistry {
    let mut registry = FamilyRegistry::new();
    register_builtin(&mut registry);
    registry
}

/// Moves attention to the `focus` argument
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusOn;

impl FocusOn {
    /// Codelet that focuses on `target`
    #[must_use]
    pub fn codelet(target: Focusable, urgency: Urgency) -> Codelet {
        Codelet::new(
            FOCUS_ON,
            Arguments::new().with("focus", ArgValue::Focus(target)),
            urgency,
        )
    }
}

impl Family for FocusOn {
    fn run(&self, controller: &mut Controller, args: &Arguments) -> Result<(), FamilyError> {
        let target = args.focus("focus")?;
        controller.workspace_mut().focus_on(target);
        Ok(())
    }
}

/// Adds `category` to `item` unless already known
#[derive(Debug, Clone, Copy, Default)]
pub struct DescribeAs;

impl DescribeAs {
    /// Codelet describing `item` as `category`
    #[must_use]
    pub fn codelet(item: ItemId, category: &str, urgency: Urgency) -> Codelet {
        Codelet::new(
            DESCRIBE_AS,
            Arguments::new()
                .with("item", ArgValue::Item(item))
                .with("category", ArgValue::Category(Category::new(category))),
            urgency,
        )
    }
}

impl Family for DescribeAs {
    fn run(&self, controller: &mut Controller, args: &Arguments) -> Result<(), FamilyError> {
        let item = args.item("item")?;
        let category = args.category("category")?;
        let known = controller
            .workspace()
            .item(item)
            .is_some_and(|i| i.is_instance_of(&category));
        if !known {
            controller.workspace_mut().describe_as(item, category)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use std::sync::Arc;
    use weft_workspace::Workspace;

    fn controller(values: &[i64]) -> Controller {
        Controller::new(EngineConfig::default(), Arc::new(builtin_registry()))
            .unwrap()
            .with_workspace(Workspace::with_items(values.iter().copied()))
    }

    #[test]
    fn builtin_names_are_registered() {
        let registry = builtin_registry();
        for name in [
            FOCUS_ON,
            DESCRIBE_AS,
            FIND_RELATION,
            GROUP_FROM_RELATION,
            EVALUATE_ALTERNATIVE,
        ] {
            assert!(registry.contains(name), "{name} missing");
        }
    }

    #[test]
    fn focus_on_records_history() {
        let mut c = controller(&[1, 2]);
        c.insert(FocusOn::codelet(Focusable::Item(ItemId(1)), Urgency::NORMAL));
        c.step().unwrap();
        assert_eq!(c.workspace().focus(), Some(Focusable::Item(ItemId(1))));
        assert_eq!(c.workspace().focus_history().count(), 1);
    }

    #[test]
    fn describe_as_is_idempotent() {
        let mut c = controller(&[4]);
        c.insert(DescribeAs::codelet(ItemId(0), "even", Urgency::NORMAL));
        c.insert(DescribeAs::codelet(ItemId(0), "even", Urgency::NORMAL));
        c.step().unwrap();
        c.step().unwrap();
        let item = c.workspace().item(ItemId(0)).unwrap();
        assert!(item.is_instance_of(&Category::new("even")));
        assert_eq!(item.categories().count(), 1);
    }

    #[test]
    fn describe_unknown_item_fails() {
        let mut c = controller(&[]);
        c.insert(DescribeAs::codelet(ItemId(3), "even", Urgency::NORMAL));
        assert!(matches!(c.step(), Err(FamilyError::Workspace(_))));
    }
}
