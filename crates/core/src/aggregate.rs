//! Per-record completion aggregates.
//!
//! A record is committed downstream only once every one of its
//! variations has produced an artifact. [`RecordAggregate`] tracks which
//! variations have succeeded and whether the commit already happened.

use std::collections::{BTreeMap, HashMap};

use crate::types::RecordId;

/// Accumulator for one record's successful variations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordAggregate {
    pub record_id: RecordId,
    pub record_index: usize,
    /// Number of variations that must succeed before commit (N).
    pub expected: u32,
    /// Sequence index -> artifact reference, only for succeeded tasks.
    artifacts: BTreeMap<u32, String>,
    committed: bool,
}

impl RecordAggregate {
    pub fn new(record_id: RecordId, record_index: usize, expected: u32) -> Self {
        Self {
            record_id,
            record_index,
            expected,
            artifacts: BTreeMap::new(),
            committed: false,
        }
    }

    /// Record the artifact of a succeeded variation.
    ///
    /// Returns `false` for sequence indexes outside `1..=expected`.
    pub fn insert(&mut self, sequence: u32, artifact_ref: String) -> bool {
        if sequence == 0 || sequence > self.expected {
            return false;
        }
        self.artifacts.insert(sequence, artifact_ref);
        true
    }

    /// Number of variations that have succeeded so far.
    pub fn succeeded(&self) -> usize {
        self.artifacts.len()
    }

    /// All variations succeeded and nothing was committed yet.
    pub fn is_ready(&self) -> bool {
        !self.committed && self.artifacts.len() == self.expected as usize
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Artifact references in sequence order.
    pub fn ordered_artifacts(&self) -> Vec<String> {
        self.artifacts.values().cloned().collect()
    }

    /// Flip the committed flag. Only legal when [`is_ready`](Self::is_ready).
    pub fn mark_committed(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.committed = true;
        true
    }
}

/// All aggregates of a run, keyed by record id.
#[derive(Debug, Clone, Default)]
pub struct RecordAggregates {
    by_id: HashMap<RecordId, RecordAggregate>,
}

impl RecordAggregates {
    pub fn insert(&mut self, aggregate: RecordAggregate) {
        self.by_id.insert(aggregate.record_id.clone(), aggregate);
    }

    pub fn get(&self, record_id: &str) -> Option<&RecordAggregate> {
        self.by_id.get(record_id)
    }

    pub fn get_mut(&mut self, record_id: &str) -> Option<&mut RecordAggregate> {
        self.by_id.get_mut(record_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
