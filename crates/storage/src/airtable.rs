//! Airtable-backed [`RecordStore`].
//!
//! Lists the rows of one table (following the `offset` cursor) and
//! commits finished drafts by PATCHing `image_1..image_N` attachment
//! fields.

use std::time::Duration;

use async_trait::async_trait;
use draftgen_core::queue::SourceRecord;
use serde::Deserialize;

use crate::error::{required_env, StorageError};
use crate::records::RecordStore;

/// Default Airtable REST endpoint.
pub const AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";

/// HTTP request timeout for a single Airtable call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Field holding the generation prompt.
pub const FIELD_PROMPT: &str = "initial_prompt";
/// Attachment field holding the reference image.
pub const FIELD_REFERENCE: &str = "reference_image_attached";
/// Field holding the trained body model id.
pub const FIELD_CHARACTER: &str = "character_id";

/// Attachment field name for a variation: `image_1`, `image_2`, ...
pub fn image_field(sequence: usize) -> String {
    format!("image_{sequence}")
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<AirtableRecord>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AirtableRecord {
    id: String,
    #[serde(default)]
    fields: serde_json::Map<String, serde_json::Value>,
}

impl AirtableRecord {
    fn into_source(self) -> SourceRecord {
        let text = |key: &str| match self.fields.get(key) {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };
        let reference = self
            .fields
            .get(FIELD_REFERENCE)
            .and_then(|v| v.as_array())
            .and_then(|list| list.first())
            .and_then(|att| att.get("url"))
            .and_then(|url| url.as_str())
            .map(str::to_string);

        SourceRecord {
            prompt: text(FIELD_PROMPT),
            character_id: text(FIELD_CHARACTER),
            reference_image_url: reference,
            dimensions: None,
            id: self.id,
        }
    }
}

// ---------------------------------------------------------------------------
// AirtableStore
// ---------------------------------------------------------------------------

/// Record store over one Airtable table.
pub struct AirtableStore {
    client: reqwest::Client,
    api_url: String,
    base_id: String,
    table: String,
    api_key: String,
}

impl AirtableStore {
    pub fn new(base_id: String, table: String, api_key: String) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_url: AIRTABLE_API_URL.to_string(),
            base_id,
            table,
            api_key,
        })
    }

    /// Load from `AIRTABLE_API_KEY` and `AIRTABLE_BASE_ID` for the given table.
    pub fn from_env(table: String) -> Result<Self, StorageError> {
        let api_key = required_env("AIRTABLE_API_KEY")?;
        let base_id = required_env("AIRTABLE_BASE_ID")?;
        Self::new(base_id, table, api_key)
    }

    /// Point the store at a different API root (proxies, tests).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn table_url(&self) -> String {
        format!("{}/{}/{}", self.api_url, self.base_id, self.table)
    }

    async fn fetch_page(&self, offset: Option<&str>) -> Result<ListResponse, StorageError> {
        let mut request = self.client.get(self.table_url()).bearer_auth(&self.api_key);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }
        let response = ensure_success(request.send().await?).await?;
        Ok(response.json::<ListResponse>().await?)
    }
}

#[async_trait]
impl RecordStore for AirtableStore {
    async fn list_records(&self) -> Result<Vec<SourceRecord>, StorageError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let page = self.fetch_page(offset.as_deref()).await?;
            records.extend(page.records.into_iter().map(AirtableRecord::into_source));
            match page.offset {
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => break,
            }
        }

        tracing::debug!(table = %self.table, count = records.len(), "Fetched records");
        Ok(records)
    }

    async fn persist(&self, record_id: &str, artifact_refs: &[String]) -> Result<(), StorageError> {
        let fields: serde_json::Map<String, serde_json::Value> = artifact_refs
            .iter()
            .enumerate()
            .map(|(i, url)| (image_field(i + 1), serde_json::json!([{ "url": url }])))
            .collect();

        let response = self
            .client
            .patch(format!("{}/{}", self.table_url(), record_id))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await?;
        ensure_success(response).await?;

        tracing::info!(record_id, images = artifact_refs.len(), "Updated record with draft images");
        Ok(())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(StorageError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}
