// Multi-commit pull-request intelligence
//
// Layers cross-commit persistence analysis, confidence scoring, and
// lifecycle-aware recommendations on top of per-run analysis reports. The
// whole layer is pure: commit reports, history, and CI signals come in as
// values, a scored PrAnalysis comes out, and reporters consume it read-only.

mod confidence;
mod context;
mod multi_commit;
mod summary;

pub use confidence::{
    apply_false_positive_reduction, calculate_multi_commit_confidence,
    calculate_pr_context_factor, calculate_regression_confidence, detect_patterns,
    enhance_regressions, EnhancedRegression,
};
pub use context::{
    CiPlatform, EnvironmentSignals, LifecyclePhase, LifecycleState, PrContext, PrLifecycle,
};
pub use multi_commit::{
    analyze_multi_commit, CommitReport, ConsistentRegression, Improvement, MultiCommitAnalysis,
};
pub use summary::{
    analyze_pr, calculate_health_trend, generate_pr_recommendations, HealthTrend, PrAnalysis,
    PrSummary, Priority, Recommendation,
};
