//! Poll responses and their classification.
//!
//! The external API only reports job state when asked. Each poll returns
//! a [`PollStatus`]; [`classify_poll`] turns it into what the scheduler
//! should do with the task next.

use serde::{Deserialize, Serialize};

/// Uniform view of one poll response from the external job API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollStatus {
    pub done: bool,
    pub success: bool,
    /// Completion percentage. Negative values signal failure.
    pub progress: f64,
    pub artifact_ref: Option<String>,
    pub error_info: Option<String>,
}

impl PollStatus {
    /// Still running at the given progress.
    pub fn running(progress: f64) -> Self {
        Self {
            done: false,
            success: false,
            progress,
            artifact_ref: None,
            error_info: None,
        }
    }

    /// Finished successfully with an artifact.
    pub fn completed(artifact_ref: impl Into<String>) -> Self {
        Self {
            done: true,
            success: true,
            progress: 100.0,
            artifact_ref: Some(artifact_ref.into()),
            error_info: None,
        }
    }

    /// Finished with an explicit failure.
    pub fn failed(error_info: impl Into<String>) -> Self {
        Self {
            done: true,
            success: false,
            progress: -1.0,
            artifact_ref: None,
            error_info: Some(error_info.into()),
        }
    }
}

/// What a single poll means for the task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollVerdict {
    /// Done, with the artifact reference to fetch.
    Completed { artifact_ref: String },
    /// Done but no artifact was reported.
    CompletedWithoutArtifact,
    /// The job failed.
    Failed { error: String },
    /// Not finished yet.
    InProgress,
}

/// Message used when the API reports failure without details.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Image generation failed";

/// Classify a poll response.
///
/// Failure (explicit flag or negative progress) wins over completion.
pub fn classify_poll(status: &PollStatus) -> PollVerdict {
    if (status.done && !status.success) || status.progress < 0.0 {
        return PollVerdict::Failed {
            error: status
                .error_info
                .clone()
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
        };
    }
    if status.done {
        return match status.artifact_ref.as_deref().map(str::trim) {
            Some(r) if !r.is_empty() => PollVerdict::Completed {
                artifact_ref: r.to_string(),
            },
            _ => PollVerdict::CompletedWithoutArtifact,
        };
    }
    PollVerdict::InProgress
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn running_is_in_progress() {
        assert_eq!(classify_poll(&PollStatus::running(40.0)), PollVerdict::InProgress);
    }

    #[test]
    fn completed_with_artifact() {
        assert_matches!(
            classify_poll(&PollStatus::completed("https://x/1.png")),
            PollVerdict::Completed { artifact_ref } if artifact_ref == "https://x/1.png"
        );
    }

    #[test]
    fn completed_with_blank_artifact_has_none() {
        let mut status = PollStatus::completed("  ");
        assert_eq!(classify_poll(&status), PollVerdict::CompletedWithoutArtifact);
        status.artifact_ref = None;
        assert_eq!(classify_poll(&status), PollVerdict::CompletedWithoutArtifact);
    }

    #[test]
    fn negative_progress_is_failure_even_if_not_done() {
        let mut status = PollStatus::running(-1.0);
        status.error_info = Some("nsfw filter".to_string());
        assert_matches!(
            classify_poll(&status),
            PollVerdict::Failed { error } if error == "nsfw filter"
        );
    }

    #[test]
    fn failure_without_info_uses_default_message() {
        let mut status = PollStatus::failed("");
        status.error_info = None;
        assert_matches!(
            classify_poll(&status),
            PollVerdict::Failed { error } if error == DEFAULT_FAILURE_MESSAGE
        );
    }
}
