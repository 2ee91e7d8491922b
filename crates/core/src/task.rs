//! Generation task model and lifecycle.
//!
//! A [`Task`] is one variation of one record. It starts `Pending`, becomes
//! `Active` once the external API accepts it and hands back a
//! [`JobHandle`], and ends in exactly one terminal state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dimensions::Dimensions;
use crate::types::{RecordId, Timestamp};

/// Opaque identifier assigned by the external API on submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inputs sent to the external API when submitting a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub prompt: String,
    pub dimensions: Dimensions,
    /// URL of the reference image the draft is conditioned on.
    pub reference_image_url: String,
    /// Optional trained body model to render with.
    pub character_id: Option<String>,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle state of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Built, not yet submitted.
    Pending,
    /// Submitted and being polled.
    Active,
    /// Finished with a usable artifact.
    Succeeded { artifact_ref: String },
    /// Finished without a usable artifact.
    Failed { kind: FailureKind, error: String },
    /// Poll-attempt ceiling reached without a terminal report.
    TimedOut,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::Failed { .. } | Self::TimedOut
        )
    }
}

/// Why a task ended in [`TaskState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The external API never accepted the task.
    SubmissionFailure,
    /// Poll calls errored too many times in a row.
    TransientPollFailure,
    /// The external job reported failure.
    TerminalFailure,
    /// The job completed but its artifact could not be fetched or stored.
    ArtifactFailure,
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// One unit of submitted work.
#[derive(Debug, Clone)]
pub struct Task {
    pub record_id: RecordId,
    /// Position of the owning record in the run's eligible record list.
    pub record_index: usize,
    /// Variation number within the record, starting at 1.
    pub sequence: u32,
    pub payload: TaskPayload,
    pub handle: Option<JobHandle>,
    pub poll_attempts: u32,
    /// Poll-call errors since the last successful poll.
    pub transient_failures: u32,
    pub created_at: Timestamp,
    pub state: TaskState,
}

impl Task {
    pub fn new(
        record_id: RecordId,
        record_index: usize,
        sequence: u32,
        payload: TaskPayload,
    ) -> Self {
        Self {
            record_id,
            record_index,
            sequence,
            payload,
            handle: None,
            poll_attempts: 0,
            transient_failures: 0,
            created_at: chrono::Utc::now(),
            state: TaskState::Pending,
        }
    }

    /// Move a pending task to `Active` with a freshly assigned handle.
    pub fn activate(&mut self, handle: JobHandle) {
        debug_assert!(matches!(self.state, TaskState::Pending));
        self.handle = Some(handle);
        self.poll_attempts = 0;
        self.transient_failures = 0;
        self.state = TaskState::Active;
    }

    /// Storage object name for this task's artifact.
    ///
    /// `draft-images/{record_id}-v{sequence}-{unix_millis}.png`
    pub fn artifact_name(&self, now: Timestamp) -> String {
        format!(
            "draft-images/{}-v{}-{}.png",
            self.record_id,
            self.sequence,
            now.timestamp_millis()
        )
    }

    /// Snapshot of a terminal task for the run's results list.
    pub fn to_result(&self) -> TaskResult {
        let (status, artifact_ref, failure, error) = match &self.state {
            TaskState::Succeeded { artifact_ref } => {
                (ResultStatus::Success, Some(artifact_ref.clone()), None, None)
            }
            TaskState::Failed { kind, error } => {
                (ResultStatus::Failed, None, Some(*kind), Some(error.clone()))
            }
            TaskState::TimedOut => (
                ResultStatus::TimedOut,
                None,
                None,
                Some("Task timeout".to_string()),
            ),
            TaskState::Pending | TaskState::Active => (
                ResultStatus::Failed,
                None,
                None,
                Some("Task did not reach a terminal state".to_string()),
            ),
        };

        TaskResult {
            record_id: self.record_id.clone(),
            record_index: self.record_index,
            sequence: self.sequence,
            handle: self.handle.clone(),
            status,
            artifact_ref,
            failure,
            error,
            poll_attempts: self.poll_attempts,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Terminal status as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Failed,
    TimedOut,
}

/// One entry of the run's append-only results list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub record_id: RecordId,
    pub record_index: usize,
    pub sequence: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<JobHandle>,
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub poll_attempts: u32,
}
