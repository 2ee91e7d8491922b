//! Draft generation run orchestration.
//!
//! [`run_draft_generation`] lists and filters records, builds the task
//! backlog and drives a [`Scheduler`] that keeps at most W jobs
//! outstanding at the image API. Finished variations flow into the
//! [`CompletionAggregator`], which commits each record exactly once when
//! all of its variations have succeeded.

pub mod aggregator;
pub mod error;
pub mod run;
pub mod scheduler;

pub use aggregator::CompletionAggregator;
pub use error::PipelineError;
pub use run::run_draft_generation;
pub use scheduler::{Scheduler, SchedulerReport};
