//! One complete draft generation run, from record listing to summary.

use draftgen_core::config::RunSettings;
use draftgen_core::dimensions::dimensions_for_reference;
use draftgen_core::error::CoreError;
use draftgen_core::outcome::RunSummary;
use draftgen_core::queue::{build_task_queue, eligible_records, SourceRecord};
use draftgen_events::ProgressReporter;
use draftgen_imagegen::JobClient;
use draftgen_storage::{ArtifactStore, RecordStore};
use validator::Validate;

use crate::error::PipelineError;
use crate::scheduler::Scheduler;

/// Run draft generation over every eligible record of `records`.
///
/// Emits `start`, `progress` and `record_updated` events while running
/// and ends the stream with `complete`. Invalid settings or a failed
/// record listing abort before scheduling with an `error` event and are
/// returned as `Err`. Individual task failures never abort the run.
pub async fn run_draft_generation(
    jobs: &dyn JobClient,
    records: &dyn RecordStore,
    artifacts: &dyn ArtifactStore,
    settings: &RunSettings,
    reporter: &mut ProgressReporter,
) -> Result<RunSummary, PipelineError> {
    let started = tokio::time::Instant::now();

    if let Err(e) = settings.validate() {
        let e = PipelineError::from(CoreError::from(e));
        tracing::error!(error = %e, "Rejected run settings");
        reporter.error(&e.to_string());
        return Err(e);
    }

    let listed = match records.list_records().await {
        Ok(listed) => listed,
        Err(e) => {
            let e = PipelineError::from(e);
            tracing::error!(error = %e, "Failed to list records");
            reporter.error(&e.to_string());
            return Err(e);
        }
    };

    let listed_count = listed.len();
    let mut eligible = eligible_records(listed);
    tracing::info!(
        listed = listed_count,
        eligible = eligible.len(),
        "Records loaded",
    );

    if eligible.is_empty() {
        let summary = RunSummary::empty(settings.scheduler.window_size);
        reporter.complete(&summary);
        return Ok(summary);
    }

    let records_considered = eligible.len();
    let total_tasks = records_considered * settings.variations_per_record as usize;
    reporter.start(total_tasks, records_considered);

    if settings.follow_reference_ratio {
        resolve_dimensions(jobs, &mut eligible).await;
    }

    let queue = build_task_queue(&eligible, settings.variations_per_record);
    debug_assert_eq!(queue.total_tasks(), total_tasks);

    let report = Scheduler::new(settings.scheduler.clone(), jobs, records, artifacts, queue)
        .run(reporter)
        .await;

    let summary = RunSummary::from_results(
        records_considered,
        total_tasks,
        settings.scheduler.window_size,
        report.results,
        report.commit_success_count,
        report.commit_failures,
        started.elapsed(),
    );
    tracing::info!(
        success_count = summary.success_count,
        failed_count = summary.failed_count,
        timed_out_count = summary.timed_out_count,
        commit_success_count = summary.commit_success_count,
        total_time_seconds = summary.total_time_seconds,
        "Draft generation complete",
    );
    reporter.complete(&summary);
    Ok(summary)
}

/// Pick output dimensions from each record's reference image.
///
/// A reference that cannot be downloaded or decoded keeps the default.
async fn resolve_dimensions(jobs: &dyn JobClient, records: &mut [SourceRecord]) {
    for record in records.iter_mut() {
        let Some(url) = record.reference_image_url.as_deref() else {
            continue;
        };
        match jobs.download(url.trim()).await {
            Ok(bytes) => {
                let dimensions = dimensions_for_reference(&bytes);
                tracing::debug!(
                    record_id = %record.id,
                    width = dimensions.width,
                    height = dimensions.height,
                    "Resolved output size from reference",
                );
                record.dimensions = Some(dimensions);
            }
            Err(e) => {
                tracing::warn!(
                    record_id = %record.id,
                    error = %e,
                    "Could not read reference image, using default size",
                );
            }
        }
    }
}
