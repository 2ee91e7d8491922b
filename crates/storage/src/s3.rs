//! S3-backed [`ArtifactStore`].

use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::artifacts::ArtifactStore;
use crate::error::StorageError;

/// Region used when `AWS_REGION` is unset.
pub const DEFAULT_REGION: &str = "ap-northeast-2";

/// Uploads artifacts to a public-read S3 bucket.
pub struct S3ArtifactStore {
    client: Client,
    bucket: String,
    region: String,
}

impl S3ArtifactStore {
    pub fn new(client: Client, bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    /// Build from the standard AWS config chain.
    ///
    /// | Env Var                              | Default          |
    /// |--------------------------------------|------------------|
    /// | `S3_BUCKET_NAME` (or `AWS_S3_BUCKET`) | required         |
    /// | `AWS_REGION`                         | `ap-northeast-2` |
    ///
    /// Credentials come from the usual `AWS_ACCESS_KEY_ID` /
    /// `AWS_SECRET_ACCESS_KEY` variables, profiles or instance metadata.
    pub async fn from_env() -> Result<Self, StorageError> {
        let bucket = ["S3_BUCKET_NAME", "AWS_S3_BUCKET"]
            .iter()
            .find_map(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| StorageError::Config("S3_BUCKET_NAME must be set".into()))?;
        let region = std::env::var("AWS_REGION")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;
        Ok(Self::new(Client::new(&config), bucket, region))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public URL of an object in this bucket.
    pub fn public_url(&self, key: &str) -> String {
        public_url(&self.bucket, &self.region, key)
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn store(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = object_key(name, &uuid::Uuid::new_v4());
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(bucket = %self.bucket, key = %key, size, "Uploaded artifact");
        Ok(self.public_url(&key))
    }
}

/// Unique object key: the artifact name behind a random prefix, keeping
/// any directory part of `name` first.
///
/// `draft-images/rec1-v1-1700.png` becomes
/// `draft-images/{uuid}-rec1-v1-1700.png`.
pub fn object_key(name: &str, id: &uuid::Uuid) -> String {
    let id = id.simple();
    match name.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/{id}-{file}"),
        None => format!("{id}-{name}"),
    }
}

/// Virtual-hosted style URL for a public object.
pub fn public_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{bucket}.s3.{region}.amazonaws.com/{key}")
}
