/// Errors from the image generation API layer.
#[derive(Debug, thiserror::Error)]
pub enum JobClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("Image API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// Submission was accepted but no job handle came back.
    #[error("No synth_id in response: {0}")]
    MissingHandle(String),

    /// Required client configuration is missing or malformed.
    #[error("Image API configuration error: {0}")]
    Config(String),
}
