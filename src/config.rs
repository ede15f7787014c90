//! Configuration for threshold classification and PR confidence scoring
//!
//! All numeric thresholds used by the classifier and the confidence engine
//! live here and are overridable by the caller; the values below are the
//! defaults. Loading (file, env, CI variables) is the caller's concern: the
//! engine only ever receives a ready `AnalysisConfig` value.

use serde::{Deserialize, Serialize};

/// Tunable thresholds for regression classification and PR-level scoring.
///
/// Fast steps need absolute-millisecond bars on top of the global percentage
/// floor so that measurement jitter on already-fast steps does not flag; the
/// presets shift how aggressively noise is suppressed.
///
/// # Example
/// ```
/// use cadencia::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.min_percentage, 3.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Upper bound (ms) of the "very fast" speed class.
    pub very_fast_limit_ms: f64,

    /// Minimum absolute slowdown (ms) before a very-fast step can regress.
    ///
    /// A 40ms step that slips to 48ms is 20% slower but still jitter
    /// territory; the absolute bar keeps it green.
    pub very_fast_min_slowdown_ms: f64,

    /// Upper bound (ms) of the "fast" speed class.
    pub fast_limit_ms: f64,

    /// Minimum absolute slowdown (ms) before a fast step can regress.
    pub fast_min_slowdown_ms: f64,

    /// Minimum slowdown percentage before a fast step can regress.
    pub fast_min_percentage: f64,

    /// Percentage floor applied to every step regardless of speed class.
    ///
    /// Keeps slow-but-stable steps from flagging on barely-positive
    /// measurement jitter.
    pub min_percentage: f64,

    /// Bounded history window per step, in samples.
    pub history_window: usize,

    /// Minimum samples in a step's window before drift detection engages.
    pub trend_min_samples: usize,

    /// Drift percentage (recent half vs older half of the window) that
    /// flags a trend.
    pub trend_threshold_pct: f64,

    /// Minimum percentage drop for a cross-commit improvement to count as
    /// material when durations are not strictly decreasing.
    pub improvement_min_drop_pct: f64,

    /// Confidence below which findings are filtered out and the PR-level
    /// assessment is flagged as low-quality data.
    pub confidence_threshold: f64,

    /// Enables the confidence-based false-positive filter. The hard noise
    /// floor (`noise_floor_percentage` / `noise_floor_slowdown_ms`) is not
    /// gated by this flag.
    pub false_positive_reduction: bool,

    /// Hard noise floor: regressions below this percentage AND below the
    /// slowdown floor are always dropped by false-positive reduction.
    pub noise_floor_percentage: f64,

    /// Hard noise floor: absolute slowdown (ms) companion to the
    /// percentage floor.
    pub noise_floor_slowdown_ms: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            very_fast_limit_ms: 50.0,
            very_fast_min_slowdown_ms: 15.0,
            fast_limit_ms: 100.0,
            fast_min_slowdown_ms: 10.0,
            fast_min_percentage: 10.0,
            min_percentage: 3.0,
            history_window: 10,
            trend_min_samples: 6,
            trend_threshold_pct: 20.0,
            improvement_min_drop_pct: 10.0,
            confidence_threshold: 0.7,
            false_positive_reduction: true,
            noise_floor_percentage: 10.0,
            noise_floor_slowdown_ms: 10.0,
        }
    }
}

impl AnalysisConfig {
    /// Strict preset: fewer false positives, more false negatives.
    ///
    /// Use when a flagged regression blocks a merge.
    pub fn strict() -> Self {
        Self {
            very_fast_min_slowdown_ms: 25.0,
            fast_min_slowdown_ms: 15.0,
            fast_min_percentage: 15.0,
            min_percentage: 5.0,
            trend_threshold_pct: 30.0,
            confidence_threshold: 0.8,
            ..Self::default()
        }
    }

    /// Permissive preset: catch potential regressions early at the cost of
    /// more noise.
    pub fn permissive() -> Self {
        Self {
            very_fast_min_slowdown_ms: 10.0,
            fast_min_slowdown_ms: 5.0,
            fast_min_percentage: 5.0,
            min_percentage: 2.0,
            trend_threshold_pct: 10.0,
            confidence_threshold: 0.5,
            ..Self::default()
        }
    }

    /// Validate configuration.
    ///
    /// Invalid thresholds are fatal to the analysis call: silently
    /// substituting defaults would corrupt the regression/green split.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("very_fast_limit_ms", self.very_fast_limit_ms),
            ("very_fast_min_slowdown_ms", self.very_fast_min_slowdown_ms),
            ("fast_limit_ms", self.fast_limit_ms),
            ("fast_min_slowdown_ms", self.fast_min_slowdown_ms),
            ("fast_min_percentage", self.fast_min_percentage),
            ("min_percentage", self.min_percentage),
            ("trend_threshold_pct", self.trend_threshold_pct),
            ("improvement_min_drop_pct", self.improvement_min_drop_pct),
            ("noise_floor_percentage", self.noise_floor_percentage),
            ("noise_floor_slowdown_ms", self.noise_floor_slowdown_ms),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be finite and non-negative, got {}", name, value));
            }
        }

        if self.very_fast_limit_ms >= self.fast_limit_ms {
            return Err(format!(
                "very_fast_limit_ms ({}) must be below fast_limit_ms ({})",
                self.very_fast_limit_ms, self.fast_limit_ms
            ));
        }

        if self.history_window < 2 {
            return Err(format!(
                "history_window must be >= 2 samples, got {}",
                self.history_window
            ));
        }

        if self.trend_min_samples < 4 {
            return Err(format!(
                "trend_min_samples must be >= 4 (two samples per window half), got {}",
                self.trend_min_samples
            ));
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "confidence_threshold must be in [0, 1], got {}",
                self.confidence_threshold
            ));
        }

        Ok(())
    }
}
