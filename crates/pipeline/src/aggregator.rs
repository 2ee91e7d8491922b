//! Per-record completion tracking and the one-time commit.

use draftgen_core::aggregate::RecordAggregates;
use draftgen_core::outcome::CommitFailure;
use draftgen_events::ProgressReporter;
use draftgen_storage::RecordStore;

/// Collects succeeded variations and commits each record once all of
/// them are in.
///
/// A record with any failed or timed-out variation never reaches its
/// expected count and is never committed. No event is emitted for it.
pub struct CompletionAggregator<'a> {
    records: &'a dyn RecordStore,
    aggregates: RecordAggregates,
    commit_success_count: usize,
    commit_failures: Vec<CommitFailure>,
}

impl<'a> CompletionAggregator<'a> {
    pub fn new(records: &'a dyn RecordStore, aggregates: RecordAggregates) -> Self {
        Self {
            records,
            aggregates,
            commit_success_count: 0,
            commit_failures: Vec::new(),
        }
    }

    /// Register a succeeded variation. Commits the record when this was
    /// its last missing variation.
    ///
    /// Returns `true` if the record was committed by this call.
    pub async fn record_success(
        &mut self,
        record_id: &str,
        sequence: u32,
        artifact_ref: String,
        reporter: &mut ProgressReporter,
    ) -> bool {
        let Some(aggregate) = self.aggregates.get_mut(record_id) else {
            tracing::warn!(record_id, sequence, "Success for unknown record ignored");
            return false;
        };
        if !aggregate.insert(sequence, artifact_ref) {
            tracing::warn!(record_id, sequence, "Sequence out of range ignored");
            return false;
        }

        tracing::debug!(
            record_id,
            succeeded = aggregate.succeeded(),
            expected = aggregate.expected,
            "Variation completed",
        );
        if !aggregate.is_ready() {
            return false;
        }

        let record_index = aggregate.record_index;
        let artifact_refs = aggregate.ordered_artifacts();

        if let Err(e) = self.records.persist(record_id, &artifact_refs).await {
            tracing::error!(record_id, error = %e, "Failed to commit record");
            self.commit_failures.push(CommitFailure {
                record_id: record_id.to_string(),
                record_index,
                error: e.to_string(),
            });
            return false;
        }

        let committed = self
            .aggregates
            .get_mut(record_id)
            .is_some_and(|aggregate| aggregate.mark_committed());
        if committed {
            self.commit_success_count += 1;
            tracing::info!(record_id, images = artifact_refs.len(), "Record committed");
            reporter.record_updated(record_id, record_index, &artifact_refs);
        }
        committed
    }

    /// Consume the aggregator, returning the number of successful
    /// commits and the rejected commits.
    pub fn into_parts(self) -> (usize, Vec<CommitFailure>) {
        (self.commit_success_count, self.commit_failures)
    }
}
