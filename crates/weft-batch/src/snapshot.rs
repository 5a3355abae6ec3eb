//! Versioned, timestamp-named snapshots of distributions
//!
//! Each save writes one JSON document named after its UTC creation time
//! (`%Y-%m-%d-%H-%M-%S.json`). A `_NNN` suffix disambiguates saves within
//! the same second and still sorts after the unsuffixed name, so the most
//! recent snapshot is always the greatest file name.

use crate::error::SnapshotError;
use crate::stats::Distributions;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Schema version written by this build
pub const SCHEMA_VERSION: u32 = 1;

const STAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";
const STAMP_LEN: usize = 19;

/// One persisted distribution set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version, see [`SCHEMA_VERSION`]
    pub schema_version: u32,
    /// When the batch was saved
    pub created_at: DateTime<Utc>,
    /// Samples per scenario
    pub distributions: Distributions,
}

#[derive(Deserialize)]
struct SchemaHeader {
    schema_version: u32,
}

/// Directory of snapshots
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    directory: PathBuf,
}

impl SnapshotStore {
    /// Store rooted at `directory`; created on first save
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Directory holding snapshot files
    #[inline]
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Save with the current time
    ///
    /// # Errors
    /// [`SnapshotError::Io`] or [`SnapshotError::Json`]
    pub fn save(&self, distributions: &Distributions) -> Result<PathBuf, SnapshotError> {
        self.save_at(distributions, Utc::now())
    }

    /// Save with an explicit creation time
    ///
    /// # Errors
    /// [`SnapshotError::Io`] or [`SnapshotError::Json`]
    pub fn save_at(
        &self,
        distributions: &Distributions,
        created_at: DateTime<Utc>,
    ) -> Result<PathBuf, SnapshotError> {
        fs::create_dir_all(&self.directory)
            .map_err(|e| SnapshotError::io(&self.directory, e))?;

        let stamp = created_at.format(STAMP_FORMAT).to_string();
        let path = self.free_path(&stamp);
        let snapshot = Snapshot {
            schema_version: SCHEMA_VERSION,
            created_at,
            distributions: distributions.clone(),
        };
        let body = serde_json::to_vec_pretty(&snapshot).map_err(|source| SnapshotError::Json {
            path: path.clone(),
            source,
        })?;

        let staging = path.with_extension("json.tmp");
        fs::write(&staging, body).map_err(|e| SnapshotError::io(&staging, e))?;
        fs::rename(&staging, &path).map_err(|e| SnapshotError::io(&path, e))?;

        info!(
            path = %path.display(),
            scenarios = distributions.len(),
            samples = distributions.total_samples(),
            "snapshot saved"
        );
        Ok(path)
    }

    fn free_path(&self, stamp: &str) -> PathBuf {
        let base = self.directory.join(format!("{stamp}.json"));
        if !base.exists() {
            return base;
        }
        (1u32..)
            .map(|n| self.directory.join(format!("{stamp}_{n:03}.json")))
            .find(|p| !p.exists())
            .unwrap_or(base)
    }

    /// Snapshot files, oldest first
    ///
    /// Only `.json` files whose name starts with a creation stamp count.
    /// A missing directory has no snapshots.
    ///
    /// # Errors
    /// [`SnapshotError::Io`] when the directory cannot be read
    pub fn list(&self) -> Result<Vec<PathBuf>, SnapshotError> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SnapshotError::io(&self.directory, e)),
        };

        let mut names: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SnapshotError::io(&self.directory, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_snapshot_name(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names.into_iter().map(|n| self.directory.join(n)).collect())
    }

    /// Most recent snapshot file, if any
    ///
    /// # Errors
    /// [`SnapshotError::Io`] when the directory cannot be read
    pub fn latest(&self) -> Result<Option<PathBuf>, SnapshotError> {
        Ok(self.list()?.pop())
    }

    /// Read one snapshot
    ///
    /// # Errors
    /// - [`SnapshotError::Io`] when the file cannot be read
    /// - [`SnapshotError::UnsupportedSchema`] for other schema versions
    /// - [`SnapshotError::Json`] when the document is malformed
    pub fn load(&self, path: &Path) -> Result<Snapshot, SnapshotError> {
        let body = fs::read(path).map_err(|e| SnapshotError::io(path, e))?;
        let json_error = |source| SnapshotError::Json {
            path: path.to_path_buf(),
            source,
        };

        let header: SchemaHeader = serde_json::from_slice(&body).map_err(json_error)?;
        if header.schema_version != SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedSchema {
                path: path.to_path_buf(),
                found: header.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        let snapshot = serde_json::from_slice(&body).map_err(json_error)?;
        debug!(path = %path.display(), "snapshot loaded");
        Ok(snapshot)
    }

    /// Read the most recent snapshot, if any
    ///
    /// # Errors
    /// As [`load`](Self::load)
    pub fn load_latest(&self) -> Result<Option<Snapshot>, SnapshotError> {
        self.latest()?.map(|path| self.load(&path)).transpose()
    }
}

fn is_snapshot_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".json") else {
        return false;
    };
    stem.get(..STAMP_LEN)
        .is_some_and(|stamp| NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_names() {
        assert!(is_snapshot_name("2024-03-01-12-00-05.json"));
        assert!(is_snapshot_name("2024-03-01-12-00-05_002.json"));
        assert!(!is_snapshot_name("notes.json"));
        assert!(!is_snapshot_name("2024-03-01-12-00-05.json.tmp"));
        assert!(!is_snapshot_name("2024-03-01.json"));
    }

    #[test]
    fn suffixed_names_sort_after_base() {
        let mut names = vec![
            "2024-03-01-12-00-05_001.json",
            "2024-03-01-12-00-05.json",
            "2024-03-01-12-00-04_002.json",
        ];
        names.sort_unstable();
        assert_eq!(names.last(), Some(&"2024-03-01-12-00-05_001.json"));
        assert_eq!(names.first(), Some(&"2024-03-01-12-00-04_002.json"));
    }
}
