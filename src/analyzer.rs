//! Per-run step analysis
//!
//! Classifies every step of one CI run against its rolling history into
//! regressions, new steps, and ok steps; updates the history window; and
//! flags long-window drift that single-run thresholds cannot see. The
//! analysis is a pure function of its inputs: the caller's history snapshot
//! is never mutated, and the updated snapshot is returned for the caller to
//! persist.

use crate::aggregate::{self, StepClass, SuiteSummary, TagSummary};
use crate::config::AnalysisConfig;
use crate::history::{History, HistoryEntry};
use crate::record::{StepContext, StepRecord};
use crate::stats;
use crate::threshold;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A step classified meaningfully slower than its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    pub step_text: String,
    pub current_duration: f64,
    /// Historical average at classification time (before this run's samples
    /// were folded in).
    pub average: f64,
    pub std_dev: f64,
    pub slowdown: f64,
    pub percentage: f64,
    pub context: StepContext,
}

/// A step with no prior history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStep {
    pub step_text: String,
    pub duration: f64,
    pub context: StepContext,
}

/// A step classified healthy against its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OkStep {
    pub step_text: String,
    pub duration: f64,
    pub average: f64,
    pub context: StepContext,
}

/// A step whose long-window drift exceeds the configured threshold.
///
/// Additive to the regression/ok classification: a creeping slowdown is
/// flagged here even when every individual run stayed under the single-run
/// thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAlert {
    pub step_text: String,
    pub current_duration: f64,
    pub average: f64,
    /// Recent-half mean vs older-half mean of the window, as a percentage.
    pub trend_pct: f64,
}

/// Counts and inventories for one analyzed run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Distinct steps classified in this run.
    pub total_steps: usize,
    /// Malformed records skipped (missing step text, unusable duration).
    pub skipped_records: usize,
    pub suites: Vec<String>,
    pub tags: Vec<String>,
    pub job_ids: Vec<String>,
}

/// Output of one run's analysis.
///
/// Every valid input step appears in exactly one of `regressions`,
/// `new_steps`, `ok`; `trends` is additive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub regressions: Vec<Regression>,
    pub new_steps: Vec<NewStep>,
    pub ok: Vec<OkStep>,
    pub trends: Vec<TrendAlert>,
    pub suites: BTreeMap<String, SuiteSummary>,
    pub tag_analysis: BTreeMap<String, TagSummary>,
    pub metadata: RunMetadata,
}

/// Report plus the updated history snapshot the caller owns persisting.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: AnalysisReport,
    pub history: History,
}

/// Analyze one run's step records against the given history snapshot.
///
/// Duplicate occurrences of a step within one run: the most recent
/// occurrence (input order) is classified; every occurrence is appended to
/// the history window in input order.
///
/// Malformed records are skipped and counted in
/// `metadata.skipped_records`; one bad telemetry record must not void the
/// whole run's signal. An invalid config is fatal.
pub fn analyze(
    run_steps: &[StepRecord],
    history: &History,
    config: &AnalysisConfig,
) -> Result<AnalysisOutcome> {
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let mut updated = history.clone();
    let mut order: Vec<String> = Vec::new();
    let mut occurrences: HashMap<String, Vec<&StepRecord>> = HashMap::new();
    let mut skipped_records = 0usize;

    for record in run_steps {
        if !record.is_valid() {
            tracing::warn!(
                "Skipping malformed step record (step_text={:?}, duration_ms={})",
                record.step_text,
                record.duration_ms
            );
            skipped_records += 1;
            continue;
        }
        match occurrences.entry(record.step_text.clone()) {
            Entry::Vacant(slot) => {
                order.push(record.step_text.clone());
                slot.insert(vec![record]);
            }
            Entry::Occupied(mut slot) => slot.get_mut().push(record),
        }
    }

    let mut regressions = Vec::new();
    let mut new_steps = Vec::new();
    let mut ok = Vec::new();
    let mut trends = Vec::new();
    let mut classified: Vec<(StepClass, f64, &StepContext)> = Vec::new();

    for step_text in &order {
        let samples = &occurrences[step_text];
        let latest = samples[samples.len() - 1];

        match updated.get_mut(step_text) {
            None => {
                new_steps.push(NewStep {
                    step_text: step_text.clone(),
                    duration: latest.duration_ms,
                    context: latest.context.clone(),
                });
                classified.push((StepClass::NewStep, latest.duration_ms, &latest.context));

                let mut entry =
                    HistoryEntry::seeded(samples[0].duration_ms, latest.context.clone());
                for record in &samples[1..] {
                    entry.push_duration(record.duration_ms, config.history_window);
                }
                updated.insert(step_text.clone(), entry);
            }
            Some(entry) => {
                let decision = threshold::classify(latest.duration_ms, entry.average, config);
                if decision.is_regression {
                    regressions.push(Regression {
                        step_text: step_text.clone(),
                        current_duration: latest.duration_ms,
                        average: entry.average,
                        std_dev: entry.std_dev,
                        slowdown: decision.slowdown_ms,
                        percentage: decision.percentage,
                        context: latest.context.clone(),
                    });
                    classified.push((StepClass::Regression, latest.duration_ms, &latest.context));
                } else {
                    ok.push(OkStep {
                        step_text: step_text.clone(),
                        duration: latest.duration_ms,
                        average: entry.average,
                        context: latest.context.clone(),
                    });
                    classified.push((StepClass::Ok, latest.duration_ms, &latest.context));
                }

                for record in samples {
                    entry.push_duration(record.duration_ms, config.history_window);
                }
                entry.context = latest.context.clone();
            }
        }

        // Drift check runs on the updated window, independent of the
        // single-run classification above.
        if let Some(entry) = updated.get(step_text) {
            if let Some(trend_pct) = drift_percentage(&entry.durations, config) {
                trends.push(TrendAlert {
                    step_text: step_text.clone(),
                    current_duration: latest.duration_ms,
                    average: entry.average,
                    trend_pct,
                });
            }
        }
    }

    let (suites, tag_analysis) = aggregate::summarize(&classified);
    let metadata = build_metadata(&occurrences, &order, skipped_records);

    Ok(AnalysisOutcome {
        report: AnalysisReport {
            regressions,
            new_steps,
            ok,
            trends,
            suites,
            tag_analysis,
            metadata,
        },
        history: updated,
    })
}

/// Drift of the window's recent half against its older half, when the
/// window is deep enough and the drift clears the configured threshold.
fn drift_percentage(durations: &[f64], config: &AnalysisConfig) -> Option<f64> {
    if durations.len() < config.trend_min_samples {
        return None;
    }
    let mid = durations.len() / 2;
    let older = stats::mean(&durations[..mid]);
    let recent = stats::mean(&durations[mid..]);
    if older <= 0.0 {
        return None;
    }
    let drift = 100.0 * (recent - older) / older;
    (drift >= config.trend_threshold_pct).then_some(drift)
}

fn build_metadata(
    occurrences: &HashMap<String, Vec<&StepRecord>>,
    order: &[String],
    skipped_records: usize,
) -> RunMetadata {
    let mut suites = BTreeSet::new();
    let mut tags = BTreeSet::new();
    let mut job_ids = BTreeSet::new();

    for samples in occurrences.values() {
        for record in samples {
            if !record.context.suite.is_empty() {
                suites.insert(record.context.suite.clone());
            }
            for tag in &record.context.tags {
                tags.insert(tag.clone());
            }
            if !record.context.job_id.is_empty() {
                job_ids.insert(record.context.job_id.clone());
            }
        }
    }

    RunMetadata {
        total_steps: order.len(),
        skipped_records,
        suites: suites.into_iter().collect(),
        tags: tags.into_iter().collect(),
        job_ids: job_ids.into_iter().collect(),
    }
}
