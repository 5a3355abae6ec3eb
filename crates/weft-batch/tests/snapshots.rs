//! Snapshot persistence

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;
use weft_batch::{Distributions, RunSample, SnapshotError, SnapshotStore, SCHEMA_VERSION};
use weft_kernel::{ErrorKind, TerminationReason};

fn distributions() -> Distributions {
    let mut ds = Distributions::new();
    ds.append(
        "A",
        RunSample {
            steps: 12,
            reason: TerminationReason::StoppingConditionMet,
            seed: 7,
            metrics: BTreeMap::from([("groups".to_string(), 2.0)]),
        },
    );
    ds.append(
        "A",
        RunSample {
            steps: 40,
            reason: TerminationReason::Errored(ErrorKind::UnknownFamily),
            seed: 8,
            metrics: BTreeMap::new(),
        },
    );
    ds.ensure("B");
    ds
}

#[test]
fn save_then_load_latest_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path().join("stats"));

    let path = store.save(&distributions()).unwrap();
    let loaded = store.load_latest().unwrap().unwrap();

    assert_eq!(loaded.schema_version, SCHEMA_VERSION);
    assert_eq!(loaded.distributions, distributions());
    assert_eq!(store.latest().unwrap(), Some(path));
}

#[test]
fn missing_directory_has_no_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path().join("nothing-here"));
    assert!(store.load_latest().unwrap().is_none());
}

#[test]
fn latest_is_greatest_timestamp() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());
    let older = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
    let newer = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let mut only_b = Distributions::new();
    only_b.ensure("B");
    store.save_at(&only_b, newer).unwrap();
    store.save_at(&distributions(), older).unwrap();
    fs::write(dir.path().join("zzz-notes.json"), "{}").unwrap();

    let latest = store.load_latest().unwrap().unwrap();
    assert_eq!(latest.created_at, newer);
    assert_eq!(latest.distributions, only_b);
}

#[test]
fn same_second_saves_do_not_collide() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());
    let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

    let first = store.save_at(&Distributions::new(), at).unwrap();
    let second = store.save_at(&distributions(), at).unwrap();

    assert_ne!(first, second);
    assert_eq!(store.list().unwrap().len(), 2);
    assert_eq!(store.latest().unwrap(), Some(second));
}

#[test]
fn unknown_schema_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());
    fs::write(
        dir.path().join("2030-01-01-00-00-00.json"),
        r#"{"schema_version": 99, "created_at": "2030-01-01T00:00:00Z", "distributions": {}}"#,
    )
    .unwrap();

    let err = store.load_latest().unwrap_err();
    assert!(matches!(
        err,
        SnapshotError::UnsupportedSchema { found: 99, .. }
    ));
}

#[test]
fn malformed_document_is_a_json_error() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());
    fs::write(dir.path().join("2030-01-01-00-00-00.json"), "not json").unwrap();
    assert!(matches!(
        store.load_latest(),
        Err(SnapshotError::Json { .. })
    ));
}
