//! Record source and commit target.

use async_trait::async_trait;
use draftgen_core::queue::SourceRecord;

use crate::error::StorageError;

/// Upstream table the run reads records from and commits artifacts to.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record of the configured table, unfiltered.
    async fn list_records(&self) -> Result<Vec<SourceRecord>, StorageError>;

    /// Commit a record's artifacts, in variation order.
    ///
    /// Called at most once per record per run.
    async fn persist(&self, record_id: &str, artifact_refs: &[String]) -> Result<(), StorageError>;
}
