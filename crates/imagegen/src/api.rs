//! REST API client for the image generation service.
//!
//! Wraps reference-conditioned task creation, task status lookup and
//! artifact download using [`reqwest`].

use std::time::Duration;

use base64::Engine;

use crate::error::JobClientError;
use crate::messages::{ReferenceGenerationRequest, TaskCreatedResponse, TaskStatusResponse};

/// Per-request timeout. Reference submissions upload a full image, so
/// this is generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(35);

/// HTTP client for the image generation API.
pub struct ImageApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Body model used when a record names no character.
    default_body_model_id: Option<String>,
}

impl ImageApi {
    /// Create a new API client.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `https://api.example.com`.
    /// * `api_key`  - Bearer token sent with every API call.
    pub fn new(base_url: String, api_key: String) -> Result<Self, JobClientError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, base_url, api_key))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            default_body_model_id: None,
        }
    }

    /// Load the client from environment variables.
    ///
    /// | Env Var                 | Required |
    /// |-------------------------|----------|
    /// | `AI_API_URL`            | yes      |
    /// | `AI_API_KEY`            | yes      |
    /// | `DEFAULT_BODY_MODEL_ID` | no       |
    pub fn from_env() -> Result<Self, JobClientError> {
        let base_url = required_env("AI_API_URL")?;
        let api_key = required_env("AI_API_KEY")?;
        let api = Self::new(base_url, api_key)?;
        Ok(api.with_default_body_model(std::env::var("DEFAULT_BODY_MODEL_ID").ok()))
    }

    /// Set the body model used when a task carries no character id.
    pub fn with_default_body_model(mut self, model_id: Option<String>) -> Self {
        self.default_body_model_id = model_id.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn default_body_model_id(&self) -> Option<&str> {
        self.default_body_model_id.as_deref()
    }

    /// Queue a reference-conditioned generation.
    ///
    /// Sends `POST /api/image-generation/reference`. The response carries
    /// the `synth_id` used for status polling.
    pub async fn generate_with_reference(
        &self,
        request: &ReferenceGenerationRequest<'_>,
    ) -> Result<TaskCreatedResponse, JobClientError> {
        let response = self
            .client
            .post(format!("{}/api/image-generation/reference", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Retrieve the current status of a generation task.
    ///
    /// Sends `GET /api/v1/image-tasks/{synth_id}/status`.
    pub async fn task_status(&self, synth_id: &str) -> Result<TaskStatusResponse, JobClientError> {
        let response = self
            .client
            .get(format!("{}/api/v1/image-tasks/{}/status", self.base_url, synth_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Download an image by absolute URL.
    ///
    /// Artifact and reference URLs point at public storage, so no
    /// credentials are sent.
    pub async fn download_bytes(&self, url: &str) -> Result<Vec<u8>, JobClientError> {
        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Download an image and encode it as standard base64.
    pub async fn download_base64(&self, url: &str) -> Result<String, JobClientError> {
        let bytes = self.download_bytes(url).await?;
        Ok(base64::prelude::BASE64_STANDARD.encode(bytes))
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`JobClientError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, JobClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(JobClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, JobClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

fn required_env(key: &str) -> Result<String, JobClientError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| JobClientError::Config(format!("{key} must be set")))
}
