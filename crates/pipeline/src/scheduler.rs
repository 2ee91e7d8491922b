//! Bounded-window polling scheduler.
//!
//! Keeps at most `window_size` jobs outstanding at the image API and
//! drives all of them from one loop:
//!
//! 1. **Fill**: submit backlog tasks until the window is full. A rejected
//!    submission becomes a `Failed` result at once and takes no slot.
//! 2. **Sweep**: every `poll_interval`, poll each active task once in
//!    insertion order, pausing `poll_pacing` after each call. Terminal
//!    tasks leave the window and are appended to the results.
//! 3. **Refill** after each sweep, until backlog and window are empty.
//!
//! The poll-attempt ceiling bounds every task, so the loop always ends.

use std::collections::VecDeque;
use std::time::Duration;

use draftgen_core::config::{SchedulerConfig, TRANSIENT_FAILURE_LIMIT};
use draftgen_core::outcome::CommitFailure;
use draftgen_core::poll::{classify_poll, PollVerdict};
use draftgen_core::queue::TaskQueue;
use draftgen_core::task::{FailureKind, Task, TaskResult, TaskState};
use draftgen_events::ProgressReporter;
use draftgen_imagegen::JobClient;
use draftgen_storage::{ArtifactStore, RecordStore};

use crate::aggregator::CompletionAggregator;
use crate::error::PipelineError;

/// Content type of re-hosted artifacts.
const ARTIFACT_CONTENT_TYPE: &str = "image/png";

/// Error text for a job that completed without reporting an artifact.
const MISSING_ARTIFACT_MESSAGE: &str = "Image generation completed without an image";

/// What a finished scheduler run hands back.
#[derive(Debug)]
pub struct SchedulerReport {
    /// One entry per dequeued task, in completion order.
    pub results: Vec<TaskResult>,
    pub commit_success_count: usize,
    pub commit_failures: Vec<CommitFailure>,
}

pub struct Scheduler<'a> {
    config: SchedulerConfig,
    jobs: &'a dyn JobClient,
    artifacts: &'a dyn ArtifactStore,
    aggregator: CompletionAggregator<'a>,
    backlog: VecDeque<Task>,
    active: Vec<Task>,
    results: Vec<TaskResult>,
    total_tasks: usize,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        config: SchedulerConfig,
        jobs: &'a dyn JobClient,
        records: &'a dyn RecordStore,
        artifacts: &'a dyn ArtifactStore,
        queue: TaskQueue,
    ) -> Self {
        let total_tasks = queue.total_tasks();
        Self {
            active: Vec::with_capacity(config.window_size.min(total_tasks)),
            config,
            jobs,
            artifacts,
            aggregator: CompletionAggregator::new(records, queue.aggregates),
            backlog: queue.backlog,
            results: Vec::with_capacity(total_tasks),
            total_tasks,
        }
    }

    /// Drive every task to a terminal state.
    pub async fn run(mut self, reporter: &mut ProgressReporter) -> SchedulerReport {
        tracing::info!(
            total_tasks = self.total_tasks,
            window_size = self.config.window_size,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            max_poll_attempts = self.config.max_poll_attempts,
            "Scheduler started",
        );

        self.fill(reporter).await;
        while !self.active.is_empty() {
            pause(self.config.poll_interval).await;
            self.sweep(reporter).await;
            self.fill(reporter).await;
        }
        debug_assert!(self.backlog.is_empty());

        let (commit_success_count, commit_failures) = self.aggregator.into_parts();
        tracing::info!(
            results = self.results.len(),
            commit_success_count,
            commit_failures = commit_failures.len(),
            "Scheduler finished",
        );

        SchedulerReport {
            results: self.results,
            commit_success_count,
            commit_failures,
        }
    }

    /// Submit backlog tasks until the window is full or the backlog is
    /// drained.
    async fn fill(&mut self, reporter: &mut ProgressReporter) {
        while self.active.len() < self.config.window_size {
            let Some(mut task) = self.backlog.pop_front() else {
                break;
            };

            match self.jobs.submit(&task.payload).await {
                Ok(handle) => {
                    tracing::info!(
                        record_id = %task.record_id,
                        sequence = task.sequence,
                        handle = %handle,
                        active = self.active.len() + 1,
                        "Task submitted",
                    );
                    task.activate(handle);
                    self.active.push(task);
                }
                Err(e) => {
                    tracing::error!(
                        record_id = %task.record_id,
                        sequence = task.sequence,
                        error = %e,
                        "Task submission failed",
                    );
                    task.state = TaskState::Failed {
                        kind: FailureKind::SubmissionFailure,
                        error: e.to_string(),
                    };
                    self.finish(task, reporter).await;
                }
            }
            debug_assert!(self.active.len() <= self.config.window_size);

            pause(self.config.submit_pacing).await;
        }
    }

    /// Poll every active task once, retiring the ones that finished.
    async fn sweep(&mut self, reporter: &mut ProgressReporter) {
        let polled = std::mem::take(&mut self.active);
        tracing::debug!(active = polled.len(), backlog = self.backlog.len(), "Sweep");

        for mut task in polled {
            self.poll_task(&mut task).await;
            if task.state.is_terminal() {
                self.finish(task, reporter).await;
            } else {
                self.active.push(task);
            }
        }
    }

    /// One poll of one active task, updating its state in place.
    async fn poll_task(&self, task: &mut Task) {
        let Some(handle) = task.handle.clone() else {
            task.state = TaskState::Failed {
                kind: FailureKind::SubmissionFailure,
                error: "Task has no job handle".to_string(),
            };
            return;
        };

        let outcome = self.jobs.poll(&handle).await;
        pause(self.config.poll_pacing).await;
        task.poll_attempts += 1;

        match outcome {
            Ok(status) => {
                task.transient_failures = 0;
                match classify_poll(&status) {
                    PollVerdict::Completed { artifact_ref } => {
                        let rehosted = self.rehost(task, &artifact_ref).await;
                        task.state = match rehosted {
                            Ok(stored) => TaskState::Succeeded {
                                artifact_ref: stored,
                            },
                            Err(e) => {
                                tracing::error!(
                                    record_id = %task.record_id,
                                    handle = %handle,
                                    error = %e,
                                    "Failed to store generated image",
                                );
                                TaskState::Failed {
                                    kind: FailureKind::ArtifactFailure,
                                    error: e.to_string(),
                                }
                            }
                        };
                    }
                    PollVerdict::CompletedWithoutArtifact => {
                        task.state = TaskState::Failed {
                            kind: FailureKind::ArtifactFailure,
                            error: MISSING_ARTIFACT_MESSAGE.to_string(),
                        };
                    }
                    PollVerdict::Failed { error } => {
                        tracing::warn!(
                            record_id = %task.record_id,
                            handle = %handle,
                            error = %error,
                            "Generation failed",
                        );
                        task.state = TaskState::Failed {
                            kind: FailureKind::TerminalFailure,
                            error,
                        };
                    }
                    PollVerdict::InProgress => {
                        tracing::debug!(
                            handle = %handle,
                            progress = status.progress,
                            attempt = task.poll_attempts,
                            "Still generating",
                        );
                    }
                }
            }
            Err(e) => {
                task.transient_failures += 1;
                tracing::warn!(
                    handle = %handle,
                    strikes = task.transient_failures,
                    error = %e,
                    "Status check failed",
                );
                if task.transient_failures >= TRANSIENT_FAILURE_LIMIT {
                    task.state = TaskState::Failed {
                        kind: FailureKind::TransientPollFailure,
                        error: e.to_string(),
                    };
                }
            }
        }

        if !task.state.is_terminal() && task.poll_attempts >= self.config.max_poll_attempts {
            tracing::warn!(
                record_id = %task.record_id,
                handle = %handle,
                attempts = task.poll_attempts,
                "Task timed out",
            );
            task.state = TaskState::TimedOut;
        }
    }

    /// Copy a finished artifact into durable storage and return its URL.
    async fn rehost(&self, task: &Task, artifact_ref: &str) -> Result<String, PipelineError> {
        let bytes = self.jobs.download(artifact_ref).await?;
        let name = task.artifact_name(chrono::Utc::now());
        let stored = self
            .artifacts
            .store(&name, bytes, ARTIFACT_CONTENT_TYPE)
            .await?;
        tracing::info!(
            record_id = %task.record_id,
            sequence = task.sequence,
            url = %stored,
            "Stored generated image",
        );
        Ok(stored)
    }

    /// Record a terminal task and hand successes to the aggregator.
    async fn finish(&mut self, task: Task, reporter: &mut ProgressReporter) {
        debug_assert!(task.state.is_terminal());
        self.results.push(task.to_result());
        reporter.progress(self.results.len(), self.total_tasks);

        if let TaskState::Succeeded { artifact_ref } = task.state {
            self.aggregator
                .record_success(&task.record_id, task.sequence, artifact_ref, reporter)
                .await;
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
