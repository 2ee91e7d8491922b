use draftgen_core::error::CoreError;
use draftgen_imagegen::JobClientError;
use draftgen_storage::StorageError;

/// Errors surfaced by the pipeline.
///
/// Task-level failures never reach the caller as errors; they end up in
/// the run's results list. Only run-level preconditions (settings,
/// record listing) abort a run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Image API error: {0}")]
    Job(#[from] JobClientError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
