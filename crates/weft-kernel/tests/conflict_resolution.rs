//! Conflict detection, subspace resolution and atomic commit through the controller

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;
use weft_kernel::families::{self, FindRelation, SpanLengthAdjudicator};
use weft_kernel::prelude::*;
use weft_kernel::ErrorKind;
use weft_test_utils::{
    controller_with, propose_codelet, seeded_controller, span, span_group, FixedVerdict,
    RecordingAdjudicator, FAIL,
};
use weft_workspace::{ItemId, Workspace};

#[test]
fn nested_proposal_conflicts_with_outer_group() {
    let mut c = seeded_controller(1);
    let outer = c.workspace_mut().insert_group(span_group(2, 5)).unwrap();

    let conflict = c.workspace_mut().insert_group(span_group(3, 4)).unwrap_err();

    assert_eq!(conflict.incumbent_ids(), vec![outer]);
    assert_eq!(conflict.proposal(), &span_group(3, 4));
    assert_eq!(c.workspace().group_count(), 1);
}

#[test]
fn resolve_sees_exactly_the_conflicting_incumbents() {
    let recorder = Arc::new(RecordingAdjudicator::new(None));
    let mut c = seeded_controller(3).with_adjudicator(recorder.clone());
    let outer = c.workspace_mut().insert_group(span_group(2, 5)).unwrap();
    c.workspace_mut().insert_group(span_group(7, 8)).unwrap();
    c.insert(propose_codelet(3, 4));

    c.step().unwrap();

    let contests = recorder.contests();
    assert_eq!(contests.len(), 1);
    assert_eq!(contests[0].proposal(), &span_group(3, 4));
    assert_eq!(contests[0].incumbents(), &[(outer, span_group(2, 5))][..]);
}

#[test]
fn zero_budget_keeps_incumbents_and_drops_proposal() {
    let config = EngineConfig::new().with_subspace_step_budget(0);
    let mut c = controller_with(config, Workspace::new())
        .with_adjudicator(Arc::new(FixedVerdict(Verdict::Proposal)));
    let outer = c.workspace_mut().insert_group(span_group(2, 5)).unwrap();
    c.insert(propose_codelet(3, 4));

    c.step().unwrap();

    assert_eq!(c.workspace().group(outer), Some(&span_group(2, 5)));
    assert_eq!(c.workspace().group_count(), 1);
    assert_eq!(c.tally().unresolved, 1);
}

#[test]
fn proposal_verdict_replaces_all_incumbents() {
    let mut c = seeded_controller(4).with_adjudicator(Arc::new(FixedVerdict(Verdict::Proposal)));
    c.workspace_mut().insert_group(span_group(2, 3)).unwrap();
    c.workspace_mut().insert_group(span_group(4, 5)).unwrap();
    c.insert(propose_codelet(1, 6));

    c.step().unwrap();

    let groups: Vec<_> = c.workspace().groups().map(|(_, g)| g.span()).collect();
    assert_eq!(groups, vec![span(1, 6)]);
    assert_eq!(c.tally().replacements, 1);
}

#[test]
fn incumbents_verdict_discards_proposal() {
    let mut c =
        seeded_controller(4).with_adjudicator(Arc::new(FixedVerdict(Verdict::Incumbents)));
    c.workspace_mut().insert_group(span_group(2, 5)).unwrap();
    c.insert(propose_codelet(3, 4));

    c.step().unwrap();

    assert_eq!(c.workspace().group_count(), 1);
    assert_eq!(c.tally().kept, 1);
}

#[test]
fn depth_limit_zero_never_spawns() {
    let recorder = Arc::new(RecordingAdjudicator::new(Some(Verdict::Proposal)));
    let config = EngineConfig::new().with_max_subspace_depth(0);
    let mut c = controller_with(config, Workspace::new()).with_adjudicator(recorder.clone());
    c.workspace_mut().insert_group(span_group(2, 5)).unwrap();
    c.insert(propose_codelet(3, 4));

    c.step().unwrap();

    assert!(recorder.contests().is_empty());
    assert_eq!(c.tally().unresolved, 1);
}

/// Seeds a failing codelet into every subspace
struct SeedFailure;

impl Adjudicator for SeedFailure {
    fn seed(&self, _contest: &Contest) -> Vec<Codelet> {
        vec![Codelet::new(FAIL, Arguments::new(), Urgency::NORMAL)]
    }
}

#[test]
fn subspace_failure_errors_the_parent_run() {
    let mut c = seeded_controller(8).with_adjudicator(Arc::new(SeedFailure));
    let outer = c.workspace_mut().insert_group(span_group(2, 5)).unwrap();
    c.insert(propose_codelet(3, 4));

    let report = c.run(None).unwrap();

    assert_eq!(report.reason, TerminationReason::Errored(ErrorKind::FamilyFailed));
    assert!(c.workspace().group(outer).is_some());
}

fn sequence_run(seed: u64) -> Controller {
    let values = [1, 2, 3, 4, 5, 5, 5, 4];
    let config = EngineConfig::new()
        .with_seed(seed)
        .with_max_steps(300)
        .with_routine_interval(10);
    let routine = (0..values.len())
        .map(|i| FindRelation::codelet(ItemId(i), Urgency::NORMAL))
        .collect();
    let mut c = Controller::new(config, Arc::new(families::builtin_registry()))
        .unwrap()
        .with_workspace(Workspace::with_items(values))
        .with_adjudicator(Arc::new(SpanLengthAdjudicator::default()))
        .with_routine(routine);
    c.run(None).unwrap();
    c
}

#[test]
fn builtin_run_is_reproducible_and_keeps_invariant() {
    let a = sequence_run(11);
    let b = sequence_run(11);

    assert_eq!(a.metrics(), b.metrics());
    let spans = |c: &Controller| c.workspace().groups().map(|(_, g)| g.span()).collect::<Vec<_>>();
    assert_eq!(spans(&a), spans(&b));
    assert!(a.workspace().check_invariants().is_ok());
    assert!(a.workspace().group_count() > 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn resolution_never_breaks_non_overlap(
        proposals in prop::collection::vec((0usize..20, 0usize..4), 1..30),
        replace in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let verdict = if replace { Verdict::Proposal } else { Verdict::Incumbents };
        let mut c = seeded_controller(seed).with_adjudicator(Arc::new(FixedVerdict(verdict)));
        for &(start, len) in &proposals {
            c.insert(propose_codelet(start, start + len));
        }

        while c.step().unwrap() {}

        prop_assert!(c.workspace().check_invariants().is_ok());
        let tally = c.tally();
        prop_assert_eq!(tally.conflicts, tally.replacements + tally.kept + tally.unresolved);
    }
}
