//! Task queue builder.
//!
//! Expands eligible records into a flat, order-preserving backlog of
//! pending tasks, one per (record, variation) pair, and creates the
//! matching completion aggregates. Pure transformation.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::aggregate::{RecordAggregate, RecordAggregates};
use crate::dimensions::{Dimensions, DEFAULT_DIMENSIONS};
use crate::task::{Task, TaskPayload};
use crate::types::RecordId;

/// A row from the upstream table, as read before eligibility filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: RecordId,
    pub prompt: Option<String>,
    pub reference_image_url: Option<String>,
    pub character_id: Option<String>,
    /// Output size resolved for this record; `None` means the default.
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
}

impl SourceRecord {
    /// A record is eligible when it has a non-blank prompt and a
    /// reference image.
    pub fn is_eligible(&self) -> bool {
        let has_prompt = self
            .prompt
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty());
        let has_reference = self
            .reference_image_url
            .as_deref()
            .is_some_and(|u| !u.trim().is_empty());
        has_prompt && has_reference
    }
}

/// Keep only eligible records, preserving order.
pub fn eligible_records(records: Vec<SourceRecord>) -> Vec<SourceRecord> {
    records.into_iter().filter(SourceRecord::is_eligible).collect()
}

/// Output of [`build_task_queue`].
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    pub backlog: VecDeque<Task>,
    pub aggregates: RecordAggregates,
    /// Number of eligible records represented in the backlog.
    pub record_count: usize,
}

impl TaskQueue {
    pub fn total_tasks(&self) -> usize {
        self.backlog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backlog.is_empty()
    }
}

/// Build the backlog for a run.
///
/// Ineligible records are dropped before flattening. Tasks are ordered
/// record by record, variations `1..=variations` within each record.
pub fn build_task_queue(records: &[SourceRecord], variations: u32) -> TaskQueue {
    let mut queue = TaskQueue::default();

    for record in records.iter().filter(|r| r.is_eligible()) {
        let (Some(prompt), Some(reference)) = (&record.prompt, &record.reference_image_url) else {
            continue;
        };
        let record_index = queue.record_count;
        let payload = TaskPayload {
            prompt: prompt.trim().to_string(),
            dimensions: record.dimensions.unwrap_or(DEFAULT_DIMENSIONS),
            reference_image_url: reference.trim().to_string(),
            character_id: record
                .character_id
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        };

        queue.aggregates.insert(RecordAggregate::new(
            record.id.clone(),
            record_index,
            variations,
        ));
        for sequence in 1..=variations {
            queue.backlog.push_back(Task::new(
                record.id.clone(),
                record_index,
                sequence,
                payload.clone(),
            ));
        }
        queue.record_count += 1;
    }

    queue
}
