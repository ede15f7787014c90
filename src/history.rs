//! Rolling per-step timing history
//!
//! One `HistoryEntry` per distinct step text: a bounded window of past
//! duration samples plus precomputed average and standard deviation. The
//! engine treats history as a value in and a value out; callers own
//! persisting the returned snapshot.

use crate::record::StepContext;
use crate::stats;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// History snapshot keyed by step text.
pub type History = HashMap<String, HistoryEntry>;

/// Bounded timing history for one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Past duration samples in milliseconds, oldest first, capped at the
    /// configured window.
    pub durations: Vec<f64>,
    /// Mean over `durations`.
    pub average: f64,
    /// Population standard deviation over `durations`.
    pub std_dev: f64,
    /// Most recent context snapshot. Display only, never classification
    /// input.
    #[serde(default)]
    pub context: StepContext,
}

impl HistoryEntry {
    /// Fresh entry seeded from a step's first observed duration.
    pub fn seeded(duration_ms: f64, context: StepContext) -> Self {
        Self {
            durations: vec![duration_ms],
            average: duration_ms,
            std_dev: 0.0,
            context,
        }
    }

    /// Append a sample, evict past the window, recompute average/std-dev.
    pub fn push_duration(&mut self, duration_ms: f64, window: usize) {
        self.durations.push(duration_ms);
        while self.durations.len() > window {
            self.durations.remove(0);
        }
        self.average = stats::mean(&self.durations);
        self.std_dev = stats::std_dev(&self.durations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_entry() {
        let entry = HistoryEntry::seeded(100.0, StepContext::default());
        assert_eq!(entry.durations, vec![100.0]);
        assert_eq!(entry.average, 100.0);
        assert_eq!(entry.std_dev, 0.0);
    }

    #[test]
    fn test_push_recomputes_statistics() {
        let mut entry = HistoryEntry::seeded(100.0, StepContext::default());
        entry.push_duration(110.0, 10);
        entry.push_duration(120.0, 10);
        assert_eq!(entry.durations.len(), 3);
        assert!((entry.average - 110.0).abs() < 0.01);
        assert!(entry.std_dev > 0.0);
    }

    #[test]
    fn test_window_evicts_oldest_first() {
        let mut entry = HistoryEntry::default();
        for i in 0..8 {
            entry.push_duration(f64::from(i), 5);
        }
        assert_eq!(entry.durations, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_window_shrink_evicts_down_to_cap() {
        let mut entry = HistoryEntry::default();
        for i in 0..10 {
            entry.push_duration(f64::from(i), 10);
        }
        // A tighter window on the next push drains the excess.
        entry.push_duration(10.0, 4);
        assert_eq!(entry.durations, vec![7.0, 8.0, 9.0, 10.0]);
    }

    #[test]
    fn test_history_roundtrips_through_json() {
        let mut history = History::new();
        let mut entry = HistoryEntry::seeded(50.0, StepContext::default());
        entry.push_duration(55.0, 10);
        history.insert("user logs in".to_string(), entry);

        let json = serde_json::to_string(&history).unwrap();
        let back: History = serde_json::from_str(&json).unwrap();
        assert_eq!(back, history);
    }
}
