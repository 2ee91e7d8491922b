//! Image API request and response bodies.
//!
//! Status responses are loosely typed upstream: `status` may be a string
//! or a number, `progress` may be missing, and the artifact URL moves
//! between several fields depending on the pipeline that produced it.
//! [`TaskStatusResponse::to_poll_status`] folds all of that into a
//! [`PollStatus`].

use draftgen_core::poll::PollStatus;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/image-generation/reference`.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceGenerationRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_model_id: Option<&'a str>,
    pub reference_image_base64: String,
    pub prompt: &'a str,
    pub width: u32,
    pub height: u32,
    pub simple_tag_ids: Vec<String>,
    pub fast_mode: bool,
}

/// Response to a task creation request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskCreatedResponse {
    #[serde(default)]
    pub synth_id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

impl TaskCreatedResponse {
    /// The handle to poll with, preferring `synth_id`.
    pub fn handle(&self) -> Option<&str> {
        self.synth_id
            .as_deref()
            .or(self.task_id.as_deref())
            .filter(|h| !h.trim().is_empty())
    }
}

/// Response of `GET /api/v1/image-tasks/{synth_id}/status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskStatusResponse {
    #[serde(default)]
    pub synth_id: Option<String>,
    #[serde(default)]
    pub status: Option<serde_json::Value>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub result_paths: Option<Vec<String>>,
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub error_info: Option<String>,
}

/// Status string for completed tasks.
pub const STATUS_COMPLETED: &str = "completed";
/// Status string for failed tasks.
pub const STATUS_FAILED: &str = "failed";

impl TaskStatusResponse {
    /// The `status` field as text, whatever its JSON type.
    pub fn status_text(&self) -> Option<String> {
        match self.status.as_ref()? {
            serde_json::Value::String(s) => Some(s.to_ascii_lowercase()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// First artifact URL in priority order: `result_paths`,
    /// `image_urls`, `image_url`.
    pub fn artifact_url(&self) -> Option<String> {
        let first = |list: &Option<Vec<String>>| {
            list.as_ref()
                .and_then(|l| l.iter().find(|u| !u.trim().is_empty()).cloned())
        };
        first(&self.result_paths)
            .or_else(|| first(&self.image_urls))
            .or_else(|| self.image_url.clone().filter(|u| !u.trim().is_empty()))
    }

    /// Fold the raw response into a uniform [`PollStatus`].
    ///
    /// `completed` or 100 % progress means done; `failed` or negative
    /// progress means failure.
    pub fn to_poll_status(&self) -> PollStatus {
        let progress = self.progress.unwrap_or(0.0);
        let status = self.status_text();

        let failed = status.as_deref() == Some(STATUS_FAILED) || progress < 0.0;
        let completed = status.as_deref() == Some(STATUS_COMPLETED) || progress >= 100.0;

        PollStatus {
            done: failed || completed,
            success: completed && !failed,
            progress,
            artifact_ref: if failed { None } else { self.artifact_url() },
            error_info: self.error_info.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> TaskStatusResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn completed_status_with_result_paths() {
        let status = parse(serde_json::json!({
            "synth_id": "s1",
            "status": "completed",
            "progress": 100,
            "result_paths": ["https://cdn/out.png"],
            "image_urls": ["https://cdn/other.png"]
        }))
        .to_poll_status();
        assert!(status.done);
        assert!(status.success);
        assert_eq!(status.artifact_ref.as_deref(), Some("https://cdn/out.png"));
    }

    #[test]
    fn full_progress_counts_as_completed() {
        let status = parse(serde_json::json!({
            "status": "processing",
            "progress": 100,
            "image_urls": ["https://cdn/a.png"]
        }))
        .to_poll_status();
        assert!(status.done && status.success);
        assert_eq!(status.artifact_ref.as_deref(), Some("https://cdn/a.png"));
    }

    #[test]
    fn failed_status_is_done_without_success() {
        let status = parse(serde_json::json!({
            "status": "FAILED",
            "error_info": "worker crashed"
        }))
        .to_poll_status();
        assert!(status.done);
        assert!(!status.success);
        assert_eq!(status.error_info.as_deref(), Some("worker crashed"));
    }

    #[test]
    fn negative_progress_is_failure() {
        let status = parse(serde_json::json!({ "status": -1, "progress": -1 })).to_poll_status();
        assert!(status.done);
        assert!(!status.success);
    }

    #[test]
    fn running_without_progress_field() {
        let status = parse(serde_json::json!({ "status": "pending" })).to_poll_status();
        assert!(!status.done);
        assert_eq!(status.progress, 0.0);
        assert!(status.artifact_ref.is_none());
    }

    #[test]
    fn single_image_url_fallback() {
        let response = parse(serde_json::json!({
            "status": "completed",
            "result_paths": [],
            "image_url": "https://cdn/single.png"
        }));
        assert_eq!(response.artifact_url().as_deref(), Some("https://cdn/single.png"));
    }

    #[test]
    fn created_response_prefers_synth_id() {
        let created: TaskCreatedResponse =
            serde_json::from_value(serde_json::json!({"synth_id": "s", "task_id": "t"})).unwrap();
        assert_eq!(created.handle(), Some("s"));

        let created: TaskCreatedResponse =
            serde_json::from_value(serde_json::json!({"task_id": "t"})).unwrap();
        assert_eq!(created.handle(), Some("t"));

        let created: TaskCreatedResponse =
            serde_json::from_value(serde_json::json!({"synth_id": ""})).unwrap();
        assert_eq!(created.handle(), None);
    }
}
