//! Testing utilities for the weft workspace
//!
//! Shared fixtures: span groups, scripted families, fixed and recording
//! adjudicators, seeded controllers.

#![allow(missing_docs)]

use parking_lot::Mutex;
use std::sync::Arc;
use weft_kernel::prelude::*;
use weft_workspace::{Endpoint, Focusable, Group, ItemId, Mapping, Relation, Span, Workspace};

pub const PROPOSE: &str = "propose";
pub const FAIL: &str = "fail";
pub const NOOP: &str = "noop";

pub fn span(start: usize, end: usize) -> Span {
    Span::new(start, end).unwrap()
}

pub fn span_group(start: usize, end: usize) -> Group {
    mapped_group(start, end, "same")
}

pub fn mapped_group(start: usize, end: usize, mapping: &str) -> Group {
    Group::new(span(start, end), Mapping::new(mapping))
}

pub fn item_relation(first: usize, second: usize, mapping: &str) -> Relation {
    Relation::new(
        Endpoint::new(Focusable::Item(ItemId(first)), Span::point(first)),
        Endpoint::new(Focusable::Item(ItemId(second)), Span::point(second)),
        Mapping::new(mapping),
    )
    .unwrap()
}

pub fn urgency(value: f64) -> Urgency {
    Urgency::new(value).unwrap()
}

/// Codelet with no arguments
pub fn bare_codelet(family: &str, weight: f64) -> Codelet {
    Codelet::new(family, Arguments::new(), urgency(weight))
}

/// `propose` codelet inserting a `same` group over `[start, end]`
pub fn propose_codelet(start: usize, end: usize) -> Codelet {
    Codelet::new(
        PROPOSE,
        Arguments::new().with("span", ArgValue::Span(span(start, end))),
        Urgency::NORMAL,
    )
}

fn propose(controller: &mut Controller, args: &Arguments) -> Result<(), FamilyError> {
    let span = args.span("span")?;
    controller
        .workspace_mut()
        .insert_group(Group::new(span, Mapping::new("same")))?;
    Ok(())
}

fn fail(_: &mut Controller, _: &Arguments) -> Result<(), FamilyError> {
    Err(FamilyError::Failed("scripted failure".into()))
}

fn noop(_: &mut Controller, _: &Arguments) -> Result<(), FamilyError> {
    Ok(())
}

/// Registry with `propose`, `fail` and `noop`
pub fn scripted_registry() -> FamilyRegistry {
    FamilyRegistry::new()
        .with(PROPOSE, propose)
        .with(FAIL, fail)
        .with(NOOP, noop)
}

/// Adjudicator that seeds nothing and always returns the same verdict
#[derive(Debug, Clone, Copy)]
pub struct FixedVerdict(pub Verdict);

impl Adjudicator for FixedVerdict {
    fn seed(&self, _contest: &Contest) -> Vec<Codelet> {
        Vec::new()
    }

    fn verdict(&self, _subspace: &Controller) -> Option<Verdict> {
        Some(self.0)
    }
}

/// Adjudicator that records every contest it is asked to seed
#[derive(Debug, Default)]
pub struct RecordingAdjudicator {
    verdict: Option<Verdict>,
    seen: Mutex<Vec<Contest>>,
}

impl RecordingAdjudicator {
    pub fn new(verdict: Option<Verdict>) -> Self {
        Self {
            verdict,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn contests(&self) -> Vec<Contest> {
        self.seen.lock().clone()
    }
}

impl Adjudicator for RecordingAdjudicator {
    fn seed(&self, contest: &Contest) -> Vec<Codelet> {
        self.seen.lock().push(contest.clone());
        Vec::new()
    }

    fn verdict(&self, _subspace: &Controller) -> Option<Verdict> {
        self.verdict
    }
}

/// Controller over the scripted registry with a seeded stream
pub fn seeded_controller(seed: u64) -> Controller {
    controller_with(EngineConfig::new().with_seed(seed), Workspace::new())
}

pub fn controller_with(config: EngineConfig, workspace: Workspace) -> Controller {
    Controller::new(config, Arc::new(scripted_registry()))
        .unwrap()
        .with_workspace(workspace)
}
