//! In-memory collaborators for pipeline tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use draftgen_core::config::{RunSettings, SchedulerConfig};
use draftgen_core::poll::PollStatus;
use draftgen_core::queue::SourceRecord;
use draftgen_core::task::{JobHandle, TaskPayload};
use draftgen_events::{ChannelSink, EventSink, ProgressReporter, RunEvent};
use draftgen_imagegen::{JobClient, JobClientError};
use draftgen_storage::{ArtifactStore, RecordStore, StorageError};
use tokio::sync::mpsc::UnboundedReceiver;

/// Shared, ordered log of collaborator calls and emitted events, e.g.
/// `submit job-1`, `poll job-1`, `download https://...`, `event start`.
pub type Journal = Arc<Mutex<Vec<String>>>;

// ---------------------------------------------------------------------------
// Job client
// ---------------------------------------------------------------------------

/// What one poll of a scripted job returns.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Running,
    Done,
    DoneWithoutArtifact,
    Fail,
    Error,
}

/// Script for one submission, consumed in submission order.
#[derive(Debug, Clone)]
pub enum Plan {
    Reject,
    Steps(Vec<Step>),
}

/// Scripted job API. Jobs without a plan finish on their first poll;
/// jobs whose steps run out keep reporting `Running`.
#[derive(Default)]
pub struct FakeJobs {
    plans: Mutex<VecDeque<Plan>>,
    steps: Mutex<HashMap<String, VecDeque<Step>>>,
    submitted: Mutex<Vec<TaskPayload>>,
    journal: Journal,
    outstanding: Mutex<(usize, usize)>,
    reference_bytes: Vec<u8>,
    fail_artifact_downloads: bool,
}

impl FakeJobs {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self {
            plans: Mutex::new(plans.into()),
            ..Default::default()
        }
    }

    pub fn with_reference_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.reference_bytes = bytes;
        self
    }

    /// Log calls into `journal` instead of a private one.
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn failing_artifact_downloads(mut self) -> Self {
        self.fail_artifact_downloads = true;
        self
    }

    pub fn submitted(&self) -> Vec<TaskPayload> {
        self.submitted.lock().unwrap().clone()
    }

    /// Handles in the order they were polled.
    pub fn polled(&self) -> Vec<String> {
        self.journal()
            .iter()
            .filter_map(|entry| entry.strip_prefix("poll "))
            .map(str::to_string)
            .collect()
    }

    /// Submit and poll calls only, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter(|entry| entry.starts_with("submit ") || entry.starts_with("poll "))
            .collect()
    }

    fn log(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }

    /// Highest number of jobs outstanding at once.
    pub fn max_outstanding(&self) -> usize {
        self.outstanding.lock().unwrap().1
    }

    fn api_error(body: &str) -> JobClientError {
        JobClientError::Api {
            status: 503,
            body: body.to_string(),
        }
    }
}

#[async_trait]
impl JobClient for FakeJobs {
    async fn submit(&self, payload: &TaskPayload) -> Result<JobHandle, JobClientError> {
        let plan = self
            .plans
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Plan::Steps(vec![Step::Done]));
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(payload.clone());
        let handle = format!("job-{}", submitted.len());
        drop(submitted);
        self.log(format!("submit {handle}"));

        match plan {
            Plan::Reject => Err(Self::api_error("queue full")),
            Plan::Steps(steps) => {
                self.steps
                    .lock()
                    .unwrap()
                    .insert(handle.clone(), steps.into());
                let mut outstanding = self.outstanding.lock().unwrap();
                outstanding.0 += 1;
                outstanding.1 = outstanding.1.max(outstanding.0);
                Ok(JobHandle::new(handle))
            }
        }
    }

    async fn poll(&self, handle: &JobHandle) -> Result<PollStatus, JobClientError> {
        self.log(format!("poll {handle}"));
        let step = self
            .steps
            .lock()
            .unwrap()
            .get_mut(handle.as_str())
            .and_then(|steps| steps.pop_front())
            .unwrap_or(Step::Running);

        if matches!(step, Step::Done | Step::DoneWithoutArtifact | Step::Fail) {
            self.outstanding.lock().unwrap().0 -= 1;
        }
        match step {
            Step::Running => Ok(PollStatus::running(50.0)),
            Step::Done => Ok(PollStatus::completed(format!("https://api.test/out/{handle}.png"))),
            Step::DoneWithoutArtifact => Ok(PollStatus {
                done: true,
                success: true,
                progress: 100.0,
                artifact_ref: None,
                error_info: None,
            }),
            Step::Fail => Ok(PollStatus::failed("worker crashed")),
            Step::Error => Err(Self::api_error("gateway timeout")),
        }
    }

    async fn download(&self, artifact_ref: &str) -> Result<Vec<u8>, JobClientError> {
        self.log(format!("download {artifact_ref}"));
        if artifact_ref.contains("/out/") {
            if self.fail_artifact_downloads {
                return Err(Self::api_error("artifact gone"));
            }
            return Ok(b"generated".to_vec());
        }
        if self.reference_bytes.is_empty() {
            return Err(Self::api_error("no reference"));
        }
        Ok(self.reference_bytes.clone())
    }
}

// ---------------------------------------------------------------------------
// Artifact store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryArtifacts {
    stored: Mutex<Vec<String>>,
}

impl MemoryArtifacts {
    pub fn stored(&self) -> Vec<String> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifacts {
    async fn store(
        &self,
        name: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        self.stored.lock().unwrap().push(name.to_string());
        Ok(format!("https://store.test/{name}"))
    }
}

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryRecords {
    records: Vec<SourceRecord>,
    persisted: Mutex<Vec<(String, Vec<String>)>>,
    failing_persist: HashSet<String>,
    fail_listing: bool,
}

impl MemoryRecords {
    pub fn new(records: Vec<SourceRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    pub fn failing_persist_for(mut self, record_id: &str) -> Self {
        self.failing_persist.insert(record_id.to_string());
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn persisted(&self) -> Vec<(String, Vec<String>)> {
        self.persisted.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for MemoryRecords {
    async fn list_records(&self) -> Result<Vec<SourceRecord>, StorageError> {
        if self.fail_listing {
            return Err(StorageError::Api {
                status: 401,
                body: "AUTHENTICATION_REQUIRED".into(),
            });
        }
        Ok(self.records.clone())
    }

    async fn persist(&self, record_id: &str, artifact_refs: &[String]) -> Result<(), StorageError> {
        if self.failing_persist.contains(record_id) {
            return Err(StorageError::Api {
                status: 422,
                body: "INVALID_ATTACHMENT".into(),
            });
        }
        self.persisted
            .lock()
            .unwrap()
            .push((record_id.to_string(), artifact_refs.to_vec()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn record(id: &str) -> SourceRecord {
    SourceRecord {
        id: id.to_string(),
        prompt: Some(format!("prompt for {id}")),
        reference_image_url: Some(format!("https://ref.test/{id}.png")),
        character_id: None,
        dimensions: None,
    }
}

pub fn records(ids: &[&str]) -> Vec<SourceRecord> {
    ids.iter().map(|id| record(id)).collect()
}

/// Settings with every pause set to zero.
pub fn settings(window_size: usize, variations: u32, max_poll_attempts: u32) -> RunSettings {
    RunSettings {
        scheduler: SchedulerConfig::immediate(window_size, max_poll_attempts),
        variations_per_record: variations,
        follow_reference_ratio: false,
    }
}

pub fn reporter() -> (ProgressReporter, UnboundedReceiver<RunEvent>) {
    let (sink, rx) = ChannelSink::channel();
    (ProgressReporter::new(Box::new(sink)), rx)
}

/// Event sink that writes `event {name}` into a shared journal.
pub struct JournalSink {
    journal: Journal,
}

impl EventSink for JournalSink {
    fn emit(&mut self, event: &RunEvent) -> bool {
        self.journal
            .lock()
            .unwrap()
            .push(format!("event {}", event.name));
        true
    }

    fn close(&mut self) {}
}

pub fn journaled_reporter(journal: Journal) -> ProgressReporter {
    ProgressReporter::new(Box::new(JournalSink { journal }))
}

pub fn drain(rx: &mut UnboundedReceiver<RunEvent>) -> Vec<RunEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn named<'a>(events: &'a [RunEvent], name: &str) -> Vec<&'a RunEvent> {
    events.iter().filter(|e| e.name == name).collect()
}
