//! Context-aware regression thresholds
//!
//! Decides whether an observed duration regresses against a step's
//! historical average. Rules are conjunctive noise filters, not independent
//! triggers: a step in a fast speed class must clear its absolute
//! millisecond bar, and every step must clear the global percentage floor.
//! Failing any applicable rule keeps the step green.

use crate::config::AnalysisConfig;

/// Outcome of classifying one observed duration against history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdDecision {
    pub is_regression: bool,
    /// `current - average` in milliseconds. Negative means the step got
    /// faster.
    pub slowdown_ms: f64,
    /// Slowdown as a percentage of the historical average. 0.0 when there
    /// is no usable baseline.
    pub percentage: f64,
}

/// Classify an observed duration against the step's historical average.
///
/// A non-positive average means no usable baseline, so the step can never
/// regress here; the analyzer reports such steps as new or ok per its own
/// policy.
pub fn classify(
    current_duration: f64,
    average: f64,
    config: &AnalysisConfig,
) -> ThresholdDecision {
    let slowdown_ms = current_duration - average;

    if average <= 0.0 {
        return ThresholdDecision {
            is_regression: false,
            slowdown_ms,
            percentage: 0.0,
        };
    }

    let percentage = 100.0 * slowdown_ms / average;

    // Faster is never a regression.
    if slowdown_ms <= 0.0 {
        return ThresholdDecision {
            is_regression: false,
            slowdown_ms,
            percentage,
        };
    }

    let mut is_regression = true;

    // Very fast steps: small relative blips are jitter until the absolute
    // bar is cleared.
    if average < config.very_fast_limit_ms {
        is_regression &= slowdown_ms >= config.very_fast_min_slowdown_ms;
    } else if average < config.fast_limit_ms {
        is_regression &= slowdown_ms >= config.fast_min_slowdown_ms
            && percentage >= config.fast_min_percentage;
    }

    // Percentage floor applies to every speed class.
    is_regression &= percentage >= config.min_percentage;

    ThresholdDecision {
        is_regression,
        slowdown_ms,
        percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slow_step_regresses_past_percentage_floor() {
        // average=100ms, current=130ms: slowdown 30ms, 30% >= 3% floor
        let decision = classify(130.0, 100.0, &AnalysisConfig::default());
        assert!(decision.is_regression);
        assert_eq!(decision.slowdown_ms, 30.0);
        assert_eq!(decision.percentage, 30.0);
    }

    #[test]
    fn test_very_fast_step_needs_absolute_bar() {
        // average=40ms, current=48ms: 20% slower but only 8ms, below the
        // 15ms very-fast bar
        let decision = classify(48.0, 40.0, &AnalysisConfig::default());
        assert!(!decision.is_regression);
        assert_eq!(decision.slowdown_ms, 8.0);
        assert!((decision.percentage - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_very_fast_step_regresses_past_absolute_bar() {
        let decision = classify(60.0, 40.0, &AnalysisConfig::default());
        assert!(decision.is_regression);
        assert_eq!(decision.slowdown_ms, 20.0);
    }

    #[test]
    fn test_fast_step_needs_both_bars() {
        // average=80ms: 8ms slowdown is 10% but below the 10ms bar
        let decision = classify(88.0, 80.0, &AnalysisConfig::default());
        assert!(!decision.is_regression);

        // 12ms slowdown is 15%: clears 10ms and 10%
        let decision = classify(92.0, 80.0, &AnalysisConfig::default());
        assert!(decision.is_regression);
    }

    #[test]
    fn test_fast_step_absolute_without_percentage_fails() {
        // average=99ms, current=108.9ms: 9.9ms slowdown, 10% exactly? No:
        // 9.9/99 = 10% but slowdown < 10ms bar
        let decision = classify(108.9, 99.0, &AnalysisConfig::default());
        assert!(!decision.is_regression);
    }

    #[test]
    fn test_percentage_floor_suppresses_jitter_on_slow_steps() {
        // 2% on a 1000ms step: 20ms slowdown fails the 3% floor
        let decision = classify(1020.0, 1000.0, &AnalysisConfig::default());
        assert!(!decision.is_regression);
        assert_eq!(decision.slowdown_ms, 20.0);
    }

    #[test]
    fn test_faster_is_never_a_regression() {
        let decision = classify(80.0, 100.0, &AnalysisConfig::default());
        assert!(!decision.is_regression);
        assert_eq!(decision.slowdown_ms, -20.0);
        assert_eq!(decision.percentage, -20.0);
    }

    #[test]
    fn test_zero_average_never_regresses() {
        let decision = classify(50.0, 0.0, &AnalysisConfig::default());
        assert!(!decision.is_regression);
        assert_eq!(decision.percentage, 0.0);
    }

    #[test]
    fn test_equal_duration_is_not_a_regression() {
        let decision = classify(100.0, 100.0, &AnalysisConfig::default());
        assert!(!decision.is_regression);
        assert_eq!(decision.slowdown_ms, 0.0);
    }

    #[test]
    fn test_strict_preset_raises_bars() {
        let config = AnalysisConfig::strict();
        // 4% on a slow step: default flags it, strict (5% floor) does not
        let decision = classify(1040.0, 1000.0, &config);
        assert!(!decision.is_regression);
        let decision = classify(1040.0, 1000.0, &AnalysisConfig::default());
        assert!(decision.is_regression);
    }
}
