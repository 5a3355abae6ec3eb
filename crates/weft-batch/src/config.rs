//! Harness configuration and the TOML file format read by the CLI
//!
//! ```toml
//! [engine]
//! seed = 42
//! max_steps = 500
//!
//! [harness]
//! num_iterations = 20
//! stats_directory = "stats"
//! stopping_condition = "fully_grouped"
//!
//! [[scenario]]
//! name = "ascending"
//! arguments = { sequence = "1 2 3 4 5" }
//! ```

use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use weft_kernel::{ArgValue, Arguments, EngineConfig};

/// Batch harness settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Runs per scenario
    pub num_iterations: usize,
    /// Where snapshots are read and written
    pub stats_directory: PathBuf,
    /// Run iterations of one scenario on the rayon pool
    pub parallel: bool,
    /// Stopping condition name; `None` or `"None"` means none
    pub stopping_condition: Option<String>,
}

impl HarnessConfig {
    /// Defaults
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With runs per scenario
    #[inline]
    #[must_use]
    pub fn with_iterations(mut self, n: usize) -> Self {
        self.num_iterations = n;
        self
    }

    /// With snapshot directory
    #[inline]
    #[must_use]
    pub fn with_stats_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.stats_directory = dir.into();
        self
    }

    /// With parallel iterations
    #[inline]
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// With stopping condition name
    #[inline]
    #[must_use]
    pub fn with_stopping_condition(mut self, name: Option<String>) -> Self {
        self.stopping_condition = name;
        self
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            num_iterations: 10,
            stats_directory: PathBuf::from("stats"),
            parallel: false,
            stopping_condition: None,
        }
    }
}

/// Scalar scenario argument as written in TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarArg {
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    Text(String),
}

impl From<ScalarArg> for ArgValue {
    fn from(value: ScalarArg) -> Self {
        match value {
            ScalarArg::Int(v) => ArgValue::Int(v),
            ScalarArg::Float(v) => ArgValue::Float(v),
            ScalarArg::Text(v) => ArgValue::Text(v),
        }
    }
}

/// `[[scenario]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Scenario name
    pub name: String,
    /// Scalar arguments by name
    #[serde(default)]
    pub arguments: BTreeMap<String, ScalarArg>,
}

impl From<ScenarioSpec> for Scenario {
    fn from(spec: ScenarioSpec) -> Self {
        let arguments: Arguments = spec
            .arguments
            .into_iter()
            .map(|(k, v)| (k, ArgValue::from(v)))
            .collect();
        Scenario::new(spec.name, arguments)
    }
}

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// `[engine]` section
    pub engine: EngineConfig,
    /// `[harness]` section
    pub harness: HarnessConfig,
    /// `[[scenario]]` entries
    #[serde(rename = "scenario")]
    pub scenarios: Vec<ScenarioSpec>,
}

impl FileConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Returns the TOML error for malformed input or unknown value types
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Scenarios in file order
    #[must_use]
    pub fn scenarios(&self) -> Vec<Scenario> {
        self.scenarios.iter().cloned().map(Scenario::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_full_file() {
        let config = FileConfig::from_toml_str(
            r#"
            [engine]
            seed = 42
            max_steps = 500

            [harness]
            num_iterations = 3
            stats_directory = "out"
            parallel = true
            stopping_condition = "fully_grouped"

            [[scenario]]
            name = "ascending"
            arguments = { sequence = "1 2 3", width = 2 }

            [[scenario]]
            name = "flat"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.seed, 42);
        assert_eq!(config.engine.max_steps, 500);
        assert_eq!(config.engine.subspace_step_budget, 20);
        assert_eq!(config.harness.num_iterations, 3);
        assert_eq!(config.harness.stats_directory, PathBuf::from("out"));
        assert!(config.harness.parallel);
        assert_eq!(
            config.harness.stopping_condition.as_deref(),
            Some("fully_grouped")
        );

        let scenarios = config.scenarios();
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0].name(), "ascending");
        assert_eq!(scenarios[0].arguments().text("sequence").unwrap(), "1 2 3");
        assert_eq!(scenarios[0].arguments().int("width").unwrap(), 2);
        assert!(scenarios[1].arguments().is_empty());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config = FileConfig::from_toml_str("").unwrap();
        assert_eq!(config, FileConfig::default());
        assert_eq!(config.harness.num_iterations, 10);
    }
}
