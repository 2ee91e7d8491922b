//! The submit/poll/download contract the scheduler drives.
//!
//! [`JobClient`] is the only view the pipeline has of the external
//! generation service. [`ImageApi`] implements it over HTTP; tests
//! substitute in-memory fakes.

use async_trait::async_trait;
use draftgen_core::poll::PollStatus;
use draftgen_core::task::{JobHandle, TaskPayload};

use crate::api::ImageApi;
use crate::error::JobClientError;
use crate::messages::ReferenceGenerationRequest;

/// A poll-based external job API.
#[async_trait]
pub trait JobClient: Send + Sync {
    /// Submit one task. Returns the handle to poll with.
    async fn submit(&self, payload: &TaskPayload) -> Result<JobHandle, JobClientError>;

    /// Ask the API for the current state of a submitted job.
    async fn poll(&self, handle: &JobHandle) -> Result<PollStatus, JobClientError>;

    /// Fetch the bytes behind an artifact (or reference) URL.
    async fn download(&self, artifact_ref: &str) -> Result<Vec<u8>, JobClientError>;
}

#[async_trait]
impl JobClient for ImageApi {
    async fn submit(&self, payload: &TaskPayload) -> Result<JobHandle, JobClientError> {
        let reference_image_base64 = self.download_base64(&payload.reference_image_url).await?;

        let request = ReferenceGenerationRequest {
            body_model_id: payload
                .character_id
                .as_deref()
                .or(self.default_body_model_id()),
            reference_image_base64,
            prompt: &payload.prompt,
            width: payload.dimensions.width,
            height: payload.dimensions.height,
            simple_tag_ids: Vec::new(),
            fast_mode: false,
        };

        let created = self.generate_with_reference(&request).await?;
        match created.handle() {
            Some(handle) => {
                tracing::debug!(handle, "Generation task created");
                Ok(JobHandle::new(handle))
            }
            None => Err(JobClientError::MissingHandle(format!("{created:?}"))),
        }
    }

    async fn poll(&self, handle: &JobHandle) -> Result<PollStatus, JobClientError> {
        let response = self.task_status(handle.as_str()).await?;
        Ok(response.to_poll_status())
    }

    async fn download(&self, artifact_ref: &str) -> Result<Vec<u8>, JobClientError> {
        self.download_bytes(artifact_ref).await
    }
}
