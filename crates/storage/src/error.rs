/// Errors from record and artifact storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Storage API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// Uploading an object failed.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Required backend configuration is missing or malformed.
    #[error("Storage configuration error: {0}")]
    Config(String),
}

/// Read a required, non-blank environment variable.
pub(crate) fn required_env(key: &str) -> Result<String, StorageError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| StorageError::Config(format!("{key} must be set")))
}
