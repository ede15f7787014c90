//! Cross-commit persistence analysis for a pull request
//!
//! Groups regressions and improvements across the PR's commits to separate
//! durable slowdowns from one-off noise. With fewer than three prior
//! commits the result is an explicit degraded `single-commit` assessment;
//! insufficient data is a defined outcome here, never an error.

use crate::analyzer::AnalysisReport;
use crate::config::AnalysisConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// One prior commit's analysis report, oldest first in `analyze_multi_commit`
/// input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitReport {
    pub commit_sha: String,
    pub report: AnalysisReport,
}

/// A step that regressed in one or more of the examined commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistentRegression {
    pub step_text: String,
    /// Commits (of those examined) in which the step regressed.
    pub regression_count: usize,
    /// `regression_count / total_commits`; 1.0 means the step regressed in
    /// every examined commit.
    pub consistency_score: f64,
    /// Regressed durations per commit, oldest commit first.
    pub durations: Vec<f64>,
    /// Union of tags observed on the regressed occurrences, sorted.
    pub tags: Vec<String>,
}

/// A step whose duration dropped materially across the examined commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    pub step_text: String,
    pub first_duration: f64,
    pub last_duration: f64,
    /// `first_duration - last_duration`, always positive.
    pub improvement: f64,
}

/// Result of examining a PR's commit sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MultiCommitAnalysis {
    /// Not enough prior commits to assess persistence; confidence is fixed
    /// at 0.5 so the caller cannot mistake this for a multi-commit signal.
    SingleCommit { confidence: f64, message: String },
    MultiCommit {
        /// Commits examined: the prior history plus the current report.
        total_commits: usize,
        consistent_regressions: Vec<ConsistentRegression>,
        improvements: Vec<Improvement>,
    },
}

/// Minimum prior commits before persistence can be assessed.
const MIN_COMMIT_HISTORY: usize = 3;

#[derive(Default)]
struct RegressionGroup {
    count: usize,
    durations: Vec<f64>,
    tags: BTreeSet<String>,
}

/// Examine the PR's commit sequence for persistent regressions and
/// improvements.
///
/// `commit_history` holds the PR's prior commits oldest first; the current
/// report is examined as one additional, newest commit.
pub fn analyze_multi_commit(
    commit_history: &[CommitReport],
    current: &AnalysisReport,
    config: &AnalysisConfig,
) -> MultiCommitAnalysis {
    if commit_history.len() < MIN_COMMIT_HISTORY {
        return MultiCommitAnalysis::SingleCommit {
            confidence: 0.5,
            message: format!(
                "Insufficient commit history for multi-commit analysis ({} of {} required prior commits)",
                commit_history.len(),
                MIN_COMMIT_HISTORY
            ),
        };
    }

    let total_commits = commit_history.len() + 1;
    let reports = commit_history
        .iter()
        .map(|c| &c.report)
        .chain(std::iter::once(current));

    let mut groups: BTreeMap<String, RegressionGroup> = BTreeMap::new();
    let mut ok_durations: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for report in reports {
        for regression in &report.regressions {
            let group = groups.entry(regression.step_text.clone()).or_default();
            group.count += 1;
            group.durations.push(regression.current_duration);
            for tag in &regression.context.tags {
                group.tags.insert(tag.clone());
            }
        }
        for ok in &report.ok {
            ok_durations
                .entry(ok.step_text.clone())
                .or_default()
                .push(ok.duration);
        }
    }

    let mut consistent_regressions: Vec<ConsistentRegression> = groups
        .into_iter()
        .map(|(step_text, group)| ConsistentRegression {
            step_text,
            regression_count: group.count,
            consistency_score: group.count as f64 / total_commits as f64,
            durations: group.durations,
            tags: group.tags.into_iter().collect(),
        })
        .collect();
    // Most persistent first; ties stay in step-text order from the map.
    consistent_regressions.sort_by(|a, b| {
        b.consistency_score
            .partial_cmp(&a.consistency_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let improvements = ok_durations
        .into_iter()
        .filter_map(|(step_text, durations)| detect_improvement(step_text, &durations, config))
        .collect();

    MultiCommitAnalysis::MultiCommit {
        total_commits,
        consistent_regressions,
        improvements,
    }
}

/// An improvement needs the step ok in at least two examined commits, with
/// durations strictly decreasing run-over-run or a latest duration
/// materially below the earliest.
fn detect_improvement(
    step_text: String,
    durations: &[f64],
    config: &AnalysisConfig,
) -> Option<Improvement> {
    if durations.len() < 2 {
        return None;
    }
    let first = durations[0];
    let last = durations[durations.len() - 1];

    let strictly_decreasing = durations.windows(2).all(|w| w[1] < w[0]);
    let material_drop =
        first > 0.0 && last <= first * (1.0 - config.improvement_min_drop_pct / 100.0);

    if (strictly_decreasing || material_drop) && last < first {
        Some(Improvement {
            step_text,
            first_duration: first,
            last_duration: last,
            improvement: first - last,
        })
    } else {
        None
    }
}
