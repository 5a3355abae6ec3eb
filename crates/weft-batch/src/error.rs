//! Error types for the batch harness

use std::path::PathBuf;
use weft_kernel::{ConfigError, StateMachineError};

/// Snapshot persistence errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Reading or writing the snapshot directory failed
    #[error("snapshot I/O at {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File is not a valid snapshot document
    #[error("malformed snapshot {path}: {source}")]
    Json {
        /// Offending file
        path: PathBuf,
        /// Decode error
        #[source]
        source: serde_json::Error,
    },

    /// Document was written with a schema this build does not read
    #[error("snapshot {path} has schema version {found}, expected {expected}")]
    UnsupportedSchema {
        /// Offending file
        path: PathBuf,
        /// Version in the file
        found: u32,
        /// Version this build reads
        expected: u32,
    },
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Batch harness errors
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Startup configuration was rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Snapshot could not be read or written
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Run lifecycle misuse by a run factory
    #[error(transparent)]
    StateMachine(#[from] StateMachineError),

    /// Scenario arguments could not be turned into a run
    #[error("scenario '{scenario}': {message}")]
    Scenario {
        /// Scenario name
        scenario: String,
        /// What was wrong
        message: String,
    },
}

impl HarnessError {
    /// Whether the error stems from the batch input rather than from
    /// running or persisting it
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Scenario { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_fatal() {
        let config: HarnessError =
            ConfigError::MissingInputSpecification("no scenarios given".into()).into();
        assert!(config.is_fatal());

        let scenario = HarnessError::Scenario {
            scenario: "A".into(),
            message: "bad sequence value".into(),
        };
        assert!(scenario.is_fatal());

        let snapshot: HarnessError = SnapshotError::UnsupportedSchema {
            path: PathBuf::from("stats/2024-01-01-00-00-00.json"),
            found: 9,
            expected: 1,
        }
        .into();
        assert!(!snapshot.is_fatal());
    }
}
