//! weft batch harness
//!
//! Runs a codelet engine many times per scenario and compares outcome
//! distributions against the previously saved snapshot.
//!
//! # Core Concepts
//!
//! - [`Scenario`] + [`RunFactory`]: what to run and how to build a seeded
//!   controller for it
//! - [`BatchHarness`]: iterations, optional rayon parallelism, abort between
//!   iterations
//! - [`Distributions`]: append-only samples per scenario
//! - [`SnapshotStore`]: versioned JSON snapshots named by creation time
//! - [`compare`]: previous vs current summaries

pub mod compare;
pub mod config;
pub mod error;
pub mod harness;
pub mod scenario;
pub mod snapshot;
pub mod stats;

pub use compare::{compare, render_table, ScenarioComparison};
pub use config::{FileConfig, HarnessConfig, ScalarArg, ScenarioSpec};
pub use error::{HarnessError, SnapshotError};
pub use harness::{derive_seed, AbortHandle, BatchHarness, BatchReport};
pub use scenario::{RunFactory, Scenario, SequenceSetup};
pub use snapshot::{Snapshot, SnapshotStore, SCHEMA_VERSION};
pub use stats::{Distribution, Distributions, RunSample, Summary};
