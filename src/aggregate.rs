//! Suite and tag health roll-ups
//!
//! Folds per-step classifications into per-suite and per-tag counters with a
//! derived health score and a bucketed category. Report maps are `BTreeMap`
//! so serialized output is deterministic.

use crate::record::StepContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Health bucket derived from a summary's health score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthCategory {
    #[default]
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

/// Bucket a health score (percentage of non-regressed steps).
pub fn health_category(health_score: f64) -> HealthCategory {
    if health_score >= 95.0 {
        HealthCategory::Excellent
    } else if health_score >= 85.0 {
        HealthCategory::Good
    } else if health_score >= 70.0 {
        HealthCategory::Fair
    } else if health_score >= 50.0 {
        HealthCategory::Poor
    } else {
        HealthCategory::Critical
    }
}

/// Aggregated health for one suite.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub regressions: usize,
    pub new_steps: usize,
    pub ok_steps: usize,
    pub total_steps: usize,
    pub avg_duration: f64,
    /// Percentage of non-regressed steps (ok + new) in the suite.
    pub health_score: f64,
    pub category: HealthCategory,
}

/// Aggregated health for one tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagSummary {
    pub regressions: usize,
    pub new_steps: usize,
    pub ok_steps: usize,
    pub total_steps: usize,
    pub avg_duration: f64,
    pub health_score: f64,
    pub category: HealthCategory,
}

/// Classification of one step, as fed into the roll-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepClass {
    Regression,
    NewStep,
    Ok,
}

#[derive(Debug, Default)]
struct Counters {
    regressions: usize,
    new_steps: usize,
    ok_steps: usize,
    total_duration: f64,
}

impl Counters {
    fn record(&mut self, class: StepClass, duration_ms: f64) {
        match class {
            StepClass::Regression => self.regressions += 1,
            StepClass::NewStep => self.new_steps += 1,
            StepClass::Ok => self.ok_steps += 1,
        }
        self.total_duration += duration_ms;
    }

    fn summarize(&self) -> (usize, f64, f64) {
        let total = self.regressions + self.new_steps + self.ok_steps;
        let avg = if total > 0 {
            self.total_duration / total as f64
        } else {
            0.0
        };
        let health = if total > 0 {
            100.0 * (self.ok_steps + self.new_steps) as f64 / total as f64
        } else {
            100.0
        };
        (total, avg, health)
    }
}

/// Fold classified steps into suite and tag summaries.
///
/// Steps with an empty suite name contribute to tag summaries only; tags
/// fold as-is, `@` prefix included.
pub fn summarize(
    steps: &[(StepClass, f64, &StepContext)],
) -> (BTreeMap<String, SuiteSummary>, BTreeMap<String, TagSummary>) {
    let mut suite_counters: BTreeMap<String, Counters> = BTreeMap::new();
    let mut tag_counters: BTreeMap<String, Counters> = BTreeMap::new();

    for (class, duration_ms, context) in steps {
        if !context.suite.is_empty() {
            suite_counters
                .entry(context.suite.clone())
                .or_default()
                .record(*class, *duration_ms);
        }
        for tag in &context.tags {
            tag_counters
                .entry(tag.clone())
                .or_default()
                .record(*class, *duration_ms);
        }
    }

    let suites = suite_counters
        .into_iter()
        .map(|(name, counters)| {
            let (total, avg, health) = counters.summarize();
            (
                name,
                SuiteSummary {
                    regressions: counters.regressions,
                    new_steps: counters.new_steps,
                    ok_steps: counters.ok_steps,
                    total_steps: total,
                    avg_duration: avg,
                    health_score: health,
                    category: health_category(health),
                },
            )
        })
        .collect();

    let tags = tag_counters
        .into_iter()
        .map(|(name, counters)| {
            let (total, avg, health) = counters.summarize();
            (
                name,
                TagSummary {
                    regressions: counters.regressions,
                    new_steps: counters.new_steps,
                    ok_steps: counters.ok_steps,
                    total_steps: total,
                    avg_duration: avg,
                    health_score: health,
                    category: health_category(health),
                },
            )
        })
        .collect();

    (suites, tags)
}
