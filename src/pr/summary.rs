//! PR-level summary, health trend, and recommendations
//!
//! Assembles the final `PrAnalysis` payload consumed by reporters: the
//! multi-commit assessment, bounded confidence, pattern score, enhanced
//! regressions, and a lifecycle-aware prioritized recommendation list.

use crate::analyzer::AnalysisReport;
use crate::config::AnalysisConfig;
use crate::history::History;
use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::confidence::{
    apply_false_positive_reduction, calculate_multi_commit_confidence, detect_patterns,
    enhance_regressions, EnhancedRegression,
};
use super::context::{EnvironmentSignals, LifecycleState, PrContext, PrLifecycle};
use super::multi_commit::{analyze_multi_commit, CommitReport, MultiCommitAnalysis};

/// Direction the PR's performance is moving in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthTrend {
    Declining,
    Improving,
    Stable,
}

/// Recommendation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// One actionable recommendation for the PR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: String,
    pub message: String,
}

/// Headline counts for the PR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrSummary {
    pub total_commits: usize,
    pub consistent_regressions: usize,
    pub improvements: usize,
    pub current_regressions: usize,
    pub health_trend: HealthTrend,
}

/// The full PR assessment consumed by reporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrAnalysis {
    pub pr_context: PrContext,
    pub lifecycle: PrLifecycle,
    pub multi_commit: MultiCommitAnalysis,
    /// Bounded [0, 1] confidence in the assessment.
    pub confidence: f64,
    /// Additive relative pattern signal, not bounded to 1.
    pub pattern_score: f64,
    pub summary: PrSummary,
    pub recommendations: Vec<Recommendation>,
    pub enhanced_regressions: Vec<EnhancedRegression>,
}

/// Health trend from the multi-commit counts: more persistent regressions
/// than improvements is declining, the reverse improving, equal stable. A
/// single-commit analysis has no counts to compare and reads stable.
pub fn calculate_health_trend(analysis: &MultiCommitAnalysis) -> HealthTrend {
    match analysis {
        MultiCommitAnalysis::SingleCommit { .. } => HealthTrend::Stable,
        MultiCommitAnalysis::MultiCommit {
            consistent_regressions,
            improvements,
            ..
        } => {
            if consistent_regressions.len() > improvements.len() {
                HealthTrend::Declining
            } else if improvements.len() > consistent_regressions.len() {
                HealthTrend::Improving
            } else {
                HealthTrend::Stable
            }
        }
    }
}

/// Generate the recommendation list. Triggers are evaluated independently;
/// zero or more recommendations come back.
pub fn generate_pr_recommendations(
    analysis: &MultiCommitAnalysis,
    lifecycle: &PrLifecycle,
    confidence: f64,
    current_report: &AnalysisReport,
    config: &AnalysisConfig,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if let MultiCommitAnalysis::MultiCommit {
        consistent_regressions,
        ..
    } = analysis
    {
        if !consistent_regressions.is_empty() {
            recommendations.push(Recommendation {
                priority: Priority::High,
                category: "pr-regressions".to_string(),
                message: format!(
                    "{} step(s) regress consistently across this pull request's commits",
                    consistent_regressions.len()
                ),
            });
        }
    }

    if confidence < config.confidence_threshold {
        recommendations.push(Recommendation {
            priority: Priority::Medium,
            category: "data-quality".to_string(),
            message: format!(
                "Low confidence in the regression signal ({:.2}); gather more commit history before acting",
                confidence
            ),
        });
    }

    if lifecycle.state == LifecycleState::Draft && !current_report.regressions.is_empty() {
        recommendations.push(Recommendation {
            priority: Priority::Low,
            category: "draft-pr".to_string(),
            message: format!(
                "{} regression(s) observed while the pull request is still a draft",
                current_report.regressions.len()
            ),
        });
    }

    recommendations
}

/// Run the full PR intelligence pipeline over the current report and the
/// PR's prior commit reports.
///
/// `history` is the updated snapshot returned by the run's `analyze` call;
/// it supplies per-step duration windows for confidence scoring. The engine
/// performs no I/O here: every input is a value the caller already
/// resolved.
pub fn analyze_pr(
    current_report: &AnalysisReport,
    commit_history: &[CommitReport],
    history: &History,
    signals: &EnvironmentSignals,
    config: &AnalysisConfig,
) -> Result<PrAnalysis> {
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let pr_context = PrContext::from_signals(signals);
    let lifecycle = PrLifecycle::from_signals(signals);

    let multi_commit = analyze_multi_commit(commit_history, current_report, config);
    let confidence = calculate_multi_commit_confidence(&multi_commit, commit_history);
    let pattern_score = detect_patterns(&multi_commit);

    let enhanced_regressions = apply_false_positive_reduction(
        enhance_regressions(current_report, history, commit_history, config),
        config,
    );

    let health_trend = calculate_health_trend(&multi_commit);
    let recommendations =
        generate_pr_recommendations(&multi_commit, &lifecycle, confidence, current_report, config);

    let (total_commits, consistent_count, improvement_count) = match &multi_commit {
        MultiCommitAnalysis::SingleCommit { .. } => (commit_history.len() + 1, 0, 0),
        MultiCommitAnalysis::MultiCommit {
            total_commits,
            consistent_regressions,
            improvements,
        } => (*total_commits, consistent_regressions.len(), improvements.len()),
    };

    let summary = PrSummary {
        total_commits,
        consistent_regressions: consistent_count,
        improvements: improvement_count,
        current_regressions: current_report.regressions.len(),
        health_trend,
    };

    Ok(PrAnalysis {
        pr_context,
        lifecycle,
        multi_commit,
        confidence,
        pattern_score,
        summary,
        recommendations,
        enhanced_regressions,
    })
}
