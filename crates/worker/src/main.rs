//! Runs one draft generation pass over an Airtable table and streams
//! progress to stdout as Server-Sent Events.
//!
//! | Env Var            | Required | Purpose                                   |
//! |--------------------|----------|-------------------------------------------|
//! | `TABLE_NAME`       | yes      | Airtable table to read and update         |
//! | `DRAFTGEN_REQUEST` | no       | JSON run request overriding the settings  |
//!
//! Scheduler settings come from `RunSettings::from_env`; collaborator
//! credentials from `ImageApi::from_env`, `AirtableStore::from_env` and
//! `S3ArtifactStore::from_env`. Logs go to stderr.

use anyhow::Context;
use draftgen_core::config::{RunRequest, RunSettings};
use draftgen_events::{ProgressReporter, SseSink};
use draftgen_imagegen::ImageApi;
use draftgen_pipeline::run_draft_generation;
use draftgen_storage::{AirtableStore, S3ArtifactStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "draftgen_worker=debug,draftgen_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = load_settings()?;
    let table = std::env::var("TABLE_NAME").context("TABLE_NAME must be set")?;

    let jobs = ImageApi::from_env().context("Failed to configure image API")?;
    let records = AirtableStore::from_env(table).context("Failed to configure Airtable")?;
    let artifacts = S3ArtifactStore::from_env()
        .await
        .context("Failed to configure S3")?;

    tracing::info!(
        table = %records.table(),
        bucket = %artifacts.bucket(),
        window_size = settings.scheduler.window_size,
        variations = settings.variations_per_record,
        "Draft generation worker starting",
    );

    let mut reporter = ProgressReporter::new(Box::new(SseSink::new(std::io::stdout())));
    let summary = run_draft_generation(&jobs, &records, &artifacts, &settings, &mut reporter).await?;

    tracing::info!(
        success_count = summary.success_count,
        commit_success_count = summary.commit_success_count,
        total_time_seconds = summary.total_time_seconds,
        "{}",
        summary.message(),
    );
    Ok(())
}

/// Environment settings, with `DRAFTGEN_REQUEST` applied on top.
fn load_settings() -> anyhow::Result<RunSettings> {
    let settings = RunSettings::from_env()?;
    match std::env::var("DRAFTGEN_REQUEST") {
        Ok(raw) if !raw.trim().is_empty() => {
            let request: RunRequest =
                serde_json::from_str(&raw).context("DRAFTGEN_REQUEST is not a valid run request")?;
            Ok(request.apply_to(settings)?)
        }
        _ => Ok(settings),
    }
}
