//! Collaborator contracts for history, run, and job persistence
//!
//! The engine treats history as a value in and a value out; these traits
//! define the boundary it never crosses itself. Persistence timing,
//! atomicity, retries, and timeouts all live behind them. `MemoryStore`
//! implements every contract for tests and single-process use.

use crate::history::History;
use crate::record::StepRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors surfaced by storage and job-coordination collaborators.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("history unavailable for project {0}")]
    HistoryUnavailable(String),

    #[error("run storage failed: {0}")]
    RunStorage(String),

    #[error("unknown job {job_id} for project {project_id}")]
    UnknownJob { project_id: String, job_id: String },

    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result type for collaborator operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Supplies and persists per-project history snapshots.
pub trait HistoryStore {
    /// A project with no stored history yields an empty snapshot, not an
    /// error.
    fn get_history(&self, project_id: &str) -> StoreResult<History>;
    fn save_history(&self, project_id: &str, history: &History) -> StoreResult<()>;
}

/// One persisted performance run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRun {
    pub run_id: String,
    pub steps: Vec<StepRecord>,
    pub timestamp_ms: u64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Persists raw runs and serves them back newest first.
pub trait RunStore {
    fn save_run(&self, project_id: &str, run: &StoredRun) -> StoreResult<()>;
    fn recent_runs(&self, project_id: &str, limit: usize) -> StoreResult<Vec<StoredRun>>;
}

/// Status of one CI shard's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Snapshot of one registered job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    pub job_id: String,
    pub status: JobStatus,
    pub updated_at_ms: u64,
}

/// Outcome of waiting on a set of parallel CI shards.
///
/// On timeout the caller proceeds with whatever shards completed and
/// surfaces the gap in run metadata; the analysis engine itself never
/// waits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobWaitOutcome {
    pub all_completed: bool,
    pub job_statuses: HashMap<String, JobStatus>,
    pub timed_out: bool,
}

/// Coordinates parallel CI shards ahead of analysis.
pub trait JobCoordinator {
    fn register_job(&self, project_id: &str, job_id: &str) -> StoreResult<()>;
    fn update_job_status(
        &self,
        project_id: &str,
        job_id: &str,
        status: JobStatus,
    ) -> StoreResult<()>;
    fn job_info(&self, project_id: &str, job_id: &str) -> StoreResult<JobInfo>;

    /// Block until every listed job completes or fails, or the timeout
    /// elapses.
    fn wait_for_jobs(
        &self,
        project_id: &str,
        job_ids: &[String],
        timeout: Duration,
        poll_interval: Duration,
    ) -> StoreResult<JobWaitOutcome>;
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Default)]
struct MemoryState {
    histories: HashMap<String, History>,
    runs: HashMap<String, Vec<StoredRun>>,
    jobs: HashMap<String, HashMap<String, JobInfo>>,
}

/// In-memory implementation of every collaborator contract.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl HistoryStore for MemoryStore {
    fn get_history(&self, project_id: &str) -> StoreResult<History> {
        Ok(self
            .lock()?
            .histories
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }

    fn save_history(&self, project_id: &str, history: &History) -> StoreResult<()> {
        self.lock()?
            .histories
            .insert(project_id.to_string(), history.clone());
        Ok(())
    }
}

impl RunStore for MemoryStore {
    fn save_run(&self, project_id: &str, run: &StoredRun) -> StoreResult<()> {
        self.lock()?
            .runs
            .entry(project_id.to_string())
            .or_default()
            .push(run.clone());
        Ok(())
    }

    fn recent_runs(&self, project_id: &str, limit: usize) -> StoreResult<Vec<StoredRun>> {
        let state = self.lock()?;
        let mut runs = state.runs.get(project_id).cloned().unwrap_or_default();
        runs.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        runs.truncate(limit);
        Ok(runs)
    }
}

impl JobCoordinator for MemoryStore {
    fn register_job(&self, project_id: &str, job_id: &str) -> StoreResult<()> {
        self.lock()?
            .jobs
            .entry(project_id.to_string())
            .or_default()
            .insert(
                job_id.to_string(),
                JobInfo {
                    job_id: job_id.to_string(),
                    status: JobStatus::Pending,
                    updated_at_ms: now_ms(),
                },
            );
        Ok(())
    }

    fn update_job_status(
        &self,
        project_id: &str,
        job_id: &str,
        status: JobStatus,
    ) -> StoreResult<()> {
        let mut state = self.lock()?;
        let info = state
            .jobs
            .get_mut(project_id)
            .and_then(|jobs| jobs.get_mut(job_id))
            .ok_or_else(|| StoreError::UnknownJob {
                project_id: project_id.to_string(),
                job_id: job_id.to_string(),
            })?;
        info.status = status;
        info.updated_at_ms = now_ms();
        Ok(())
    }

    fn job_info(&self, project_id: &str, job_id: &str) -> StoreResult<JobInfo> {
        self.lock()?
            .jobs
            .get(project_id)
            .and_then(|jobs| jobs.get(job_id))
            .cloned()
            .ok_or_else(|| StoreError::UnknownJob {
                project_id: project_id.to_string(),
                job_id: job_id.to_string(),
            })
    }

    fn wait_for_jobs(
        &self,
        project_id: &str,
        job_ids: &[String],
        timeout: Duration,
        poll_interval: Duration,
    ) -> StoreResult<JobWaitOutcome> {
        let deadline = Instant::now() + timeout;
        loop {
            let job_statuses: HashMap<String, JobStatus> = {
                let state = self.lock()?;
                job_ids
                    .iter()
                    .map(|job_id| {
                        let status = state
                            .jobs
                            .get(project_id)
                            .and_then(|jobs| jobs.get(job_id))
                            .map(|info| info.status)
                            .unwrap_or(JobStatus::Pending);
                        (job_id.clone(), status)
                    })
                    .collect()
            };

            let all_completed = job_statuses
                .values()
                .all(|s| matches!(s, JobStatus::Completed | JobStatus::Failed));
            if all_completed {
                return Ok(JobWaitOutcome {
                    all_completed: true,
                    job_statuses,
                    timed_out: false,
                });
            }

            if Instant::now() >= deadline {
                return Ok(JobWaitOutcome {
                    all_completed: false,
                    job_statuses,
                    timed_out: true,
                });
            }

            std::thread::sleep(poll_interval.min(deadline.saturating_duration_since(Instant::now())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryEntry;
    use crate::record::StepContext;

    #[test]
    fn test_missing_history_is_empty_not_error() {
        let store = MemoryStore::new();
        let history = store.get_history("nope").unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_history_roundtrip() {
        let store = MemoryStore::new();
        let mut history = History::new();
        history.insert(
            "login".to_string(),
            HistoryEntry::seeded(100.0, StepContext::default()),
        );
        store.save_history("proj", &history).unwrap();
        assert_eq!(store.get_history("proj").unwrap(), history);
    }

    #[test]
    fn test_recent_runs_newest_first_with_limit() {
        let store = MemoryStore::new();
        for (id, ts) in [("r1", 100), ("r2", 300), ("r3", 200)] {
            store
                .save_run(
                    "proj",
                    &StoredRun {
                        run_id: id.to_string(),
                        steps: vec![],
                        timestamp_ms: ts,
                        metadata: HashMap::new(),
                    },
                )
                .unwrap();
        }
        let runs = store.recent_runs("proj", 2).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].run_id, "r2");
        assert_eq!(runs[1].run_id, "r3");
    }

    #[test]
    fn test_job_registration_and_status() {
        let store = MemoryStore::new();
        store.register_job("proj", "shard-1").unwrap();
        assert_eq!(
            store.job_info("proj", "shard-1").unwrap().status,
            JobStatus::Pending
        );

        store
            .update_job_status("proj", "shard-1", JobStatus::Completed)
            .unwrap();
        assert_eq!(
            store.job_info("proj", "shard-1").unwrap().status,
            JobStatus::Completed
        );
    }

    #[test]
    fn test_unknown_job_is_an_error() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.job_info("proj", "ghost"),
            Err(StoreError::UnknownJob { .. })
        ));
        assert!(store
            .update_job_status("proj", "ghost", JobStatus::Running)
            .is_err());
    }

    #[test]
    fn test_wait_returns_once_all_jobs_resolve() {
        let store = MemoryStore::new();
        store.register_job("proj", "shard-1").unwrap();
        store.register_job("proj", "shard-2").unwrap();
        store
            .update_job_status("proj", "shard-1", JobStatus::Completed)
            .unwrap();
        store
            .update_job_status("proj", "shard-2", JobStatus::Failed)
            .unwrap();

        let outcome = store
            .wait_for_jobs(
                "proj",
                &["shard-1".to_string(), "shard-2".to_string()],
                Duration::from_millis(100),
                Duration::from_millis(5),
            )
            .unwrap();
        assert!(outcome.all_completed);
        assert!(!outcome.timed_out);
        assert_eq!(outcome.job_statuses["shard-2"], JobStatus::Failed);
    }

    #[test]
    fn test_wait_times_out_on_stuck_shard() {
        let store = MemoryStore::new();
        store.register_job("proj", "stuck").unwrap();

        let outcome = store
            .wait_for_jobs(
                "proj",
                &["stuck".to_string()],
                Duration::from_millis(30),
                Duration::from_millis(5),
            )
            .unwrap();
        assert!(!outcome.all_completed);
        assert!(outcome.timed_out);
        assert_eq!(outcome.job_statuses["stuck"], JobStatus::Pending);
    }
}
