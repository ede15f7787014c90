//! Pull-request context and lifecycle derivation
//!
//! CI platform signals arrive as an explicit `EnvironmentSignals` value, so
//! extraction stays a pure function of its input and unit tests never touch
//! the process environment. Lifecycle state is derived fresh per invocation
//! from the current event signal, never transitioned in-process.

use serde::{Deserialize, Serialize};

/// Raw CI event signals, as gathered by the caller.
///
/// Platform detection heuristics live with the caller; the engine only
/// consumes the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSignals {
    pub is_pull_request: bool,
    pub is_draft: bool,
    pub is_approved: bool,
    pub is_push: bool,
    pub is_merge: bool,
    pub pr_number: Option<u64>,
    pub commit_sha: String,
    pub branch: String,
    pub target_branch: String,
    pub author_name: String,
    pub author_email: String,
    /// Platform name as detected by the caller, e.g. `github-actions`.
    pub platform: String,
}

/// CI platform the signals were gathered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CiPlatform {
    GithubActions,
    GitlabCi,
    CircleCi,
    Jenkins,
    Unknown,
}

impl CiPlatform {
    /// Map a caller-supplied platform name; unrecognized names stay
    /// `Unknown` rather than failing.
    pub fn from_signal(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "github-actions" | "github" => CiPlatform::GithubActions,
            "gitlab-ci" | "gitlab" => CiPlatform::GitlabCi,
            "circleci" | "circle-ci" => CiPlatform::CircleCi,
            "jenkins" => CiPlatform::Jenkins,
            _ => CiPlatform::Unknown,
        }
    }

    /// Branch assumed as merge target when the signals carry none.
    pub fn default_target_branch(self) -> &'static str {
        "main"
    }
}

/// Pull-request identity attached to a PR analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrContext {
    pub pr_number: Option<u64>,
    pub commit_sha: String,
    pub branch: String,
    pub target_branch: String,
    pub author_name: String,
    pub author_email: String,
    pub platform: CiPlatform,
}

impl PrContext {
    /// Extract a PR context from raw signals, filling defaults where the
    /// signals are empty.
    pub fn from_signals(signals: &EnvironmentSignals) -> Self {
        let platform = CiPlatform::from_signal(&signals.platform);
        let target_branch = if signals.target_branch.is_empty() {
            platform.default_target_branch().to_string()
        } else {
            signals.target_branch.clone()
        };
        Self {
            pr_number: signals.pr_number,
            commit_sha: signals.commit_sha.clone(),
            branch: signals.branch.clone(),
            target_branch,
            author_name: signals.author_name.clone(),
            author_email: signals.author_email.clone(),
            platform,
        }
    }
}

/// Where the PR sits in its review/merge workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleState {
    Draft,
    Approved,
    Review,
    Push,
    Merged,
    Unknown,
}

/// Coarser phase derived from the lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecyclePhase {
    Development,
    ReadyToMerge,
    CodeReview,
    Merged,
    Unknown,
}

/// Derived lifecycle snapshot for the current CI event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrLifecycle {
    pub state: LifecycleState,
    pub phase: LifecyclePhase,
    pub is_draft: bool,
    pub is_approved: bool,
}

impl PrLifecycle {
    /// Resolve the lifecycle from the current event signals.
    ///
    /// Resolution order: draft flag, approved flag, plain pull-request
    /// event, push event, merge event. Anything else resolves to an
    /// explicit unknown state rather than silently defaulting to review.
    pub fn from_signals(signals: &EnvironmentSignals) -> Self {
        let (state, phase) = if signals.is_draft {
            (LifecycleState::Draft, LifecyclePhase::Development)
        } else if signals.is_approved {
            (LifecycleState::Approved, LifecyclePhase::ReadyToMerge)
        } else if signals.is_pull_request {
            (LifecycleState::Review, LifecyclePhase::CodeReview)
        } else if signals.is_push {
            (LifecycleState::Push, LifecyclePhase::Development)
        } else if signals.is_merge {
            (LifecycleState::Merged, LifecyclePhase::Merged)
        } else {
            (LifecycleState::Unknown, LifecyclePhase::Unknown)
        };

        Self {
            state,
            phase,
            is_draft: signals.is_draft,
            is_approved: signals.is_approved,
        }
    }
}
