//! Step records and execution context
//!
//! A `StepRecord` is one timed execution of a named test step, as emitted by
//! the CI run. Context normalization is total: every field deserializes to a
//! defined empty value when absent, so downstream code never branches on
//! missing-vs-empty.

use serde::{Deserialize, Serialize};

/// Tag carried by steps on the critical path; raises confidence scoring.
pub const CRITICAL_TAG: &str = "@critical";

/// Execution metadata attached to a step occurrence.
///
/// Every field has a defined empty default; deserializing a payload with
/// missing fields produces the same value as explicit empties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepContext {
    pub test_file: String,
    pub test_name: String,
    pub suite: String,
    /// Tags in declaration order, each `@`-prefixed by convention
    /// (e.g. `@critical`).
    pub tags: Vec<String>,
    pub job_id: String,
    pub worker_id: String,
}

impl StepContext {
    /// Whether the context carries the given tag (exact match).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// One timed execution of a test step.
///
/// `step_text` is the identity key; history and cross-commit grouping match
/// it exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    #[serde(default)]
    pub step_text: String,
    /// Duration in milliseconds.
    #[serde(default)]
    pub duration_ms: f64,
    /// Epoch milliseconds at which the step ran.
    #[serde(default)]
    pub timestamp_ms: u64,
    #[serde(default)]
    pub context: StepContext,
}

impl StepRecord {
    /// A record is analyzable when it carries an identity and a usable
    /// duration. Invalid records are skipped and counted, never fatal.
    pub fn is_valid(&self) -> bool {
        !self.step_text.is_empty() && self.duration_ms.is_finite() && self.duration_ms >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_normalizes_missing_fields_to_empty() {
        let ctx: StepContext = serde_json::from_str("{}").unwrap();
        assert_eq!(ctx, StepContext::default());
        assert_eq!(ctx.suite, "");
        assert!(ctx.tags.is_empty());
    }

    #[test]
    fn test_context_partial_payload() {
        let ctx: StepContext =
            serde_json::from_str(r#"{"suite": "checkout", "tags": ["@critical"]}"#).unwrap();
        assert_eq!(ctx.suite, "checkout");
        assert!(ctx.has_tag("@critical"));
        assert_eq!(ctx.test_file, "");
        assert_eq!(ctx.worker_id, "");
    }

    #[test]
    fn test_has_tag_exact_match_only() {
        let ctx = StepContext {
            tags: vec!["@critical".to_string(), "@smoke".to_string()],
            ..StepContext::default()
        };
        assert!(ctx.has_tag("@critical"));
        assert!(ctx.has_tag("@smoke"));
        assert!(!ctx.has_tag("critical"));
        assert!(!ctx.has_tag("@crit"));
    }

    #[test]
    fn test_valid_record() {
        let record = StepRecord {
            step_text: "user logs in".to_string(),
            duration_ms: 120.5,
            timestamp_ms: 1_700_000_000_000,
            context: StepContext::default(),
        };
        assert!(record.is_valid());
    }

    #[test]
    fn test_missing_step_text_is_invalid() {
        let record: StepRecord = serde_json::from_str(r#"{"duration_ms": 10.0}"#).unwrap();
        assert!(!record.is_valid());
    }

    #[test]
    fn test_non_finite_duration_is_invalid() {
        let record = StepRecord {
            step_text: "step".to_string(),
            duration_ms: f64::NAN,
            timestamp_ms: 0,
            context: StepContext::default(),
        };
        assert!(!record.is_valid());
    }

    #[test]
    fn test_negative_duration_is_invalid() {
        let record = StepRecord {
            step_text: "step".to_string(),
            duration_ms: -1.0,
            timestamp_ms: 0,
            context: StepContext::default(),
        };
        assert!(!record.is_valid());
    }

    #[test]
    fn test_zero_duration_is_valid() {
        let record = StepRecord {
            step_text: "step".to_string(),
            duration_ms: 0.0,
            timestamp_ms: 0,
            context: StepContext::default(),
        };
        assert!(record.is_valid());
    }
}
