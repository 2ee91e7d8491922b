//! Run-level outcome types reported in the `complete` event.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::task::{ResultStatus, TaskResult};
use crate::types::RecordId;

/// A commit attempt that the persistence collaborator rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFailure {
    pub record_id: RecordId,
    pub record_index: usize,
    pub error: String,
}

/// Final totals of one draft generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Eligible records that were queued.
    pub records_considered: usize,
    /// Tasks in the backlog at the start of the run.
    pub total_tasks: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub timed_out_count: usize,
    pub commit_success_count: usize,
    pub commit_failure_count: usize,
    pub window_size: usize,
    pub total_time_seconds: u64,
    /// One entry per task that left the backlog, in completion order.
    pub results: Vec<TaskResult>,
    pub commit_failures: Vec<CommitFailure>,
}

impl RunSummary {
    /// Summary of a run that never scheduled anything.
    pub fn empty(window_size: usize) -> Self {
        Self::from_results(0, 0, window_size, Vec::new(), 0, Vec::new(), Duration::ZERO)
    }

    pub fn from_results(
        records_considered: usize,
        total_tasks: usize,
        window_size: usize,
        results: Vec<TaskResult>,
        commit_success_count: usize,
        commit_failures: Vec<CommitFailure>,
        elapsed: Duration,
    ) -> Self {
        let count = |status: ResultStatus| results.iter().filter(|r| r.status == status).count();

        Self {
            records_considered,
            total_tasks,
            success_count: count(ResultStatus::Success),
            failed_count: count(ResultStatus::Failed),
            timed_out_count: count(ResultStatus::TimedOut),
            commit_success_count,
            commit_failure_count: commit_failures.len(),
            window_size,
            total_time_seconds: elapsed.as_secs_f64().round() as u64,
            results,
            commit_failures,
        }
    }

    /// Human-readable one-line description of the run.
    pub fn message(&self) -> String {
        if self.records_considered == 0 {
            return "No records ready for draft generation".to_string();
        }
        format!(
            "Draft generation complete. {} of {} tasks succeeded across {} records; {} records updated.",
            self.success_count, self.total_tasks, self.records_considered, self.commit_success_count,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: ResultStatus) -> TaskResult {
        TaskResult {
            record_id: "r".into(),
            record_index: 0,
            sequence: 1,
            handle: None,
            status,
            artifact_ref: None,
            failure: None,
            error: None,
            poll_attempts: 1,
        }
    }

    #[test]
    fn counts_by_status() {
        let summary = RunSummary::from_results(
            1,
            4,
            2,
            vec![
                result(ResultStatus::Success),
                result(ResultStatus::Failed),
                result(ResultStatus::Success),
                result(ResultStatus::TimedOut),
            ],
            0,
            Vec::new(),
            Duration::from_millis(2600),
        );
        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.failed_count, 1);
        assert_eq!(summary.timed_out_count, 1);
        assert_eq!(summary.total_time_seconds, 3);
    }

    #[test]
    fn empty_summary_has_zero_totals() {
        let summary = RunSummary::empty(5);
        assert_eq!(summary.total_tasks, 0);
        assert_eq!(summary.success_count, 0);
        assert!(summary.results.is_empty());
        assert_eq!(summary.message(), "No records ready for draft generation");
    }
}
