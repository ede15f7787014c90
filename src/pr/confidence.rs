//! Confidence scoring and pattern detection for PR-level findings
//!
//! Every score is bounded to [0, 1] except the pattern score, which is an
//! additive relative signal. Confidence combines statistical significance
//! (sigmas above the historical average), magnitude relative to the
//! configured noise floors, and a PR-context boost for findings that recur
//! across the PR's commits or sit on the critical path.

use crate::analyzer::{AnalysisReport, Regression};
use crate::config::AnalysisConfig;
use crate::history::History;
use crate::record::{StepContext, CRITICAL_TAG};
use crate::stats;
use serde::{Deserialize, Serialize};

use super::multi_commit::{CommitReport, MultiCommitAnalysis};

/// Commits of evidence at which count-based signals saturate.
const EVIDENCE_WINDOW: f64 = 5.0;

/// A regression annotated with its confidence and PR-context factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedRegression {
    #[serde(flatten)]
    pub regression: Regression,
    pub confidence: f64,
    pub pr_context_factor: f64,
}

/// Confidence that a single flagged regression is a true positive.
///
/// Components: sigmas above the historical average (up to 0.5, saturating
/// at three sigma, scaled down while the history window is shallow),
/// magnitude relative to the configured noise floors (up to 0.3), and the
/// PR-context factor (up to 0.3). Clamped to [0, 1].
pub fn calculate_regression_confidence(
    regression: &Regression,
    step_durations: &[f64],
    pr_history: &[CommitReport],
    config: &AnalysisConfig,
) -> f64 {
    // A deep window is what makes the sigma signal believable.
    let sample_trust = (step_durations.len() as f64 / EVIDENCE_WINDOW).min(1.0);
    let sigma = stats::z_score(
        regression.current_duration,
        regression.average,
        regression.std_dev,
    );
    let significance = (sigma / 3.0).clamp(0.0, 1.0) * 0.5 * sample_trust;

    let pct_saturation = config.noise_floor_percentage * 5.0;
    let slowdown_saturation = config.noise_floor_slowdown_ms * 20.0;
    let magnitude = saturating_ratio(regression.percentage, pct_saturation) * 0.2
        + saturating_ratio(regression.slowdown, slowdown_saturation) * 0.1;

    let context_factor =
        calculate_pr_context_factor(&regression.step_text, &regression.context, pr_history);

    (significance + magnitude + context_factor).clamp(0.0, 1.0)
}

/// PR-context boost for a regression: recurrence of the same step as a
/// regression in prior commits (0.1 per recurrence, capped at 0.2) plus a
/// critical-path tag (0.1). Bounded to [0, 0.3].
pub fn calculate_pr_context_factor(
    step_text: &str,
    context: &StepContext,
    pr_history: &[CommitReport],
) -> f64 {
    let recurrences = pr_history
        .iter()
        .filter(|commit| {
            commit
                .report
                .regressions
                .iter()
                .any(|r| r.step_text == step_text)
        })
        .count();
    let recurrence_boost = (recurrences as f64 * 0.1).min(0.2);
    let critical_boost = if context.has_tag(CRITICAL_TAG) { 0.1 } else { 0.0 };
    recurrence_boost + critical_boost
}

/// Confidence in the PR-level multi-commit assessment.
///
/// Starts from a neutral 0.5. Consistent regressions add strength
/// (consistency score and occurrence count, each saturating over a
/// five-commit evidence window), scaled by how much of the PR's history was
/// examined; critical-tagged persistence adds a diversity boost. Clamped to
/// [0, 1]. A single-commit analysis passes its fixed confidence through.
pub fn calculate_multi_commit_confidence(
    analysis: &MultiCommitAnalysis,
    commit_history: &[CommitReport],
) -> f64 {
    match analysis {
        MultiCommitAnalysis::SingleCommit { confidence, .. } => *confidence,
        MultiCommitAnalysis::MultiCommit {
            total_commits,
            consistent_regressions,
            ..
        } => {
            let available = commit_history.len() + 1;
            let examined_fraction = (*total_commits as f64 / available as f64).min(1.0);
            let evidence = (*total_commits as f64 / EVIDENCE_WINDOW).min(1.0);
            let scale = examined_fraction * evidence;

            if consistent_regressions.is_empty() {
                // No persistent findings: confidence grows with the amount
                // of data backing the all-clear.
                return (0.5 + 0.2 * scale).clamp(0.0, 1.0);
            }

            let strength = consistent_regressions
                .iter()
                .map(|r| {
                    0.5 * r.consistency_score
                        + 0.5 * (r.regression_count as f64 / EVIDENCE_WINDOW).min(1.0)
                })
                .sum::<f64>()
                / consistent_regressions.len() as f64;

            let critical_steps = consistent_regressions
                .iter()
                .filter(|r| r.regression_count >= 2 && r.tags.iter().any(|t| t == CRITICAL_TAG))
                .count();
            let tag_boost = match critical_steps {
                0 => 0.0,
                1 => 0.1,
                _ => 0.15,
            };

            (0.5 + 0.4 * strength * scale + tag_boost).clamp(0.0, 1.0)
        }
    }
}

/// Higher-level pattern score over the consistent regressions.
///
/// Critical-path clustering: two or more distinct regressed steps, each
/// critical-tagged and regressing in at least two commits, contribute 0.15
/// per step. Escalating degradation: a strictly increasing per-commit
/// duration sequence (three or more samples) contributes 0.1 per step.
/// Additive and not bounded to 1: a relative signal, not a probability.
pub fn detect_patterns(analysis: &MultiCommitAnalysis) -> f64 {
    let MultiCommitAnalysis::MultiCommit {
        consistent_regressions,
        ..
    } = analysis
    else {
        return 0.0;
    };

    let mut score = 0.0;

    let clustered = consistent_regressions
        .iter()
        .filter(|r| r.regression_count >= 2 && r.tags.iter().any(|t| t == CRITICAL_TAG))
        .count();
    if clustered >= 2 {
        score += 0.15 * clustered as f64;
    }

    for regression in consistent_regressions {
        if regression.durations.len() >= 3
            && regression.durations.windows(2).all(|w| w[1] > w[0])
        {
            score += 0.1;
        }
    }

    score
}

/// Annotate the current report's regressions with confidence and
/// PR-context factor, most confident first.
pub fn enhance_regressions(
    report: &AnalysisReport,
    history: &History,
    pr_history: &[CommitReport],
    config: &AnalysisConfig,
) -> Vec<EnhancedRegression> {
    let mut enhanced: Vec<EnhancedRegression> = report
        .regressions
        .iter()
        .map(|regression| {
            let durations = history
                .get(&regression.step_text)
                .map(|entry| entry.durations.as_slice())
                .unwrap_or(&[]);
            let pr_context_factor = calculate_pr_context_factor(
                &regression.step_text,
                &regression.context,
                pr_history,
            );
            let confidence =
                calculate_regression_confidence(regression, durations, pr_history, config);
            EnhancedRegression {
                regression: regression.clone(),
                confidence,
                pr_context_factor,
            }
        })
        .collect();

    enhanced.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    enhanced
}

/// Drop noisy findings.
///
/// Two filters. The hard noise floor (percentage and slowdown both under
/// the configured floors) applies unconditionally: small absolute plus
/// small relative change is assumed measurement jitter whatever the scoring
/// model says. The confidence-threshold filter applies only while
/// `false_positive_reduction` is enabled.
pub fn apply_false_positive_reduction(
    enhanced: Vec<EnhancedRegression>,
    config: &AnalysisConfig,
) -> Vec<EnhancedRegression> {
    enhanced
        .into_iter()
        .filter(|e| {
            let r = &e.regression;
            if r.percentage < config.noise_floor_percentage
                && r.slowdown < config.noise_floor_slowdown_ms
            {
                tracing::debug!(
                    "Dropping low-magnitude regression {:?} ({}%, {}ms)",
                    r.step_text,
                    r.percentage,
                    r.slowdown
                );
                return false;
            }
            if config.false_positive_reduction && e.confidence < config.confidence_threshold {
                tracing::debug!(
                    "Dropping low-confidence regression {:?} (confidence {:.2})",
                    r.step_text,
                    e.confidence
                );
                return false;
            }
            true
        })
        .collect()
}

fn saturating_ratio(value: f64, saturation: f64) -> f64 {
    if saturation <= 0.0 {
        return 0.0;
    }
    (value / saturation).clamp(0.0, 1.0)
}
