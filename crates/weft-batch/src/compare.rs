//! Previous vs current comparison

use crate::stats::{Distributions, Summary};
use serde::Serialize;
use std::fmt::Write as _;

/// One scenario's summaries across two epochs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioComparison {
    /// Scenario name
    pub scenario: String,
    /// Summary from the previous snapshot
    pub previous: Option<Summary>,
    /// Summary from this batch
    pub current: Option<Summary>,
}

impl ScenarioComparison {
    /// Change in success rate, when both epochs have samples
    #[must_use]
    pub fn success_rate_delta(&self) -> Option<f64> {
        let (previous, current) = self.both()?;
        Some(current.success_rate - previous.success_rate)
    }

    /// Change in mean steps, when both epochs have samples
    #[must_use]
    pub fn mean_steps_delta(&self) -> Option<f64> {
        let (previous, current) = self.both()?;
        Some(current.mean_steps - previous.mean_steps)
    }

    fn both(&self) -> Option<(&Summary, &Summary)> {
        let previous = self.previous.as_ref().filter(|s| s.runs > 0)?;
        let current = self.current.as_ref().filter(|s| s.runs > 0)?;
        Some((previous, current))
    }
}

/// Pair up scenarios: current ones in order, then those only in `previous`
#[must_use]
pub fn compare(previous: Option<&Distributions>, current: &Distributions) -> Vec<ScenarioComparison> {
    let mut rows: Vec<ScenarioComparison> = current
        .iter()
        .map(|(name, distribution)| ScenarioComparison {
            scenario: name.to_string(),
            previous: previous.and_then(|p| p.get(name)).map(|d| d.summary()),
            current: Some(distribution.summary()),
        })
        .collect();

    if let Some(previous) = previous {
        rows.extend(
            previous
                .iter()
                .filter(|(name, _)| current.get(name).is_none())
                .map(|(name, distribution)| ScenarioComparison {
                    scenario: name.to_string(),
                    previous: Some(distribution.summary()),
                    current: None,
                }),
        );
    }
    rows
}

/// Plain-text table of comparisons
#[must_use]
pub fn render_table(rows: &[ScenarioComparison]) -> String {
    let width = rows
        .iter()
        .map(|r| r.scenario.len())
        .max()
        .unwrap_or(0)
        .max("scenario".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<width$}  {:>17}  {:>17}  {:>15}  {:>15}",
        "scenario", "runs (prev/cur)", "success %", "mean steps", "median steps"
    );
    let _ = writeln!(out, "{}", "-".repeat(width + 2 + 17 + 2 + 17 + 2 + 15 + 2 + 15));

    for row in rows {
        let pair = |f: fn(&Summary) -> String| {
            format!(
                "{}/{}",
                row.previous.as_ref().map_or_else(|| "-".to_string(), f),
                row.current.as_ref().map_or_else(|| "-".to_string(), f)
            )
        };
        let _ = writeln!(
            out,
            "{:<width$}  {:>17}  {:>17}  {:>15}  {:>15}",
            row.scenario,
            pair(|s| s.runs.to_string()),
            pair(|s| format!("{:.1}", s.success_rate * 100.0)),
            pair(|s| format!("{:.1}", s.mean_steps)),
            pair(|s| format!("{:.1}", s.median_steps)),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::RunSample;
    use std::collections::BTreeMap;
    use weft_kernel::TerminationReason;

    fn distributions(entries: &[(&str, &[(u64, bool)])]) -> Distributions {
        let mut ds = Distributions::new();
        for (name, samples) in entries {
            ds.ensure(name);
            for &(steps, success) in *samples {
                ds.append(
                    name,
                    RunSample {
                        steps,
                        reason: if success {
                            TerminationReason::StoppingConditionMet
                        } else {
                            TerminationReason::StepCapReached
                        },
                        seed: 0,
                        metrics: BTreeMap::new(),
                    },
                );
            }
        }
        ds
    }

    #[test]
    fn pairs_scenarios_across_epochs() {
        let previous = distributions(&[("a", &[(10, false)]), ("gone", &[(5, true)])]);
        let current = distributions(&[("a", &[(4, true), (6, true)]), ("new", &[(1, true)])]);

        let rows = compare(Some(&previous), &current);
        let names: Vec<_> = rows.iter().map(|r| r.scenario.as_str()).collect();
        assert_eq!(names, vec!["a", "new", "gone"]);

        assert_eq!(rows[0].success_rate_delta(), Some(1.0));
        assert_eq!(rows[0].mean_steps_delta(), Some(-5.0));
        assert!(rows[1].previous.is_none());
        assert!(rows[2].current.is_none());
        assert_eq!(rows[2].success_rate_delta(), None);
    }

    #[test]
    fn table_has_a_row_per_scenario() {
        let current = distributions(&[("alpha", &[(3, true)])]);
        let table = render_table(&compare(None, &current));
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("alpha"));
        assert!(lines[2].contains("-/1"));
    }
}
