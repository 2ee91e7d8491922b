//! Shapes run progress into [`RunEvent`]s and writes them to a sink.
//!
//! Once `complete` or `error` has been emitted the sink is closed and
//! every later call is a silent no-op. A sink that reports itself gone
//! is logged once; the run keeps going so bookkeeping and commits still
//! happen.

use draftgen_core::outcome::RunSummary;
use draftgen_core::run_events::{
    EVENT_COMPLETE, EVENT_ERROR, EVENT_PROGRESS, EVENT_RECORD_UPDATED, EVENT_START,
};

use crate::event::RunEvent;
use crate::sink::EventSink;

pub struct ProgressReporter {
    sink: Box<dyn EventSink>,
    finished: bool,
    sink_lost: bool,
}

impl ProgressReporter {
    pub fn new(sink: Box<dyn EventSink>) -> Self {
        Self {
            sink,
            finished: false,
            sink_lost: false,
        }
    }

    /// Whether `complete` or `error` has already been emitted.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the sink has refused an event.
    pub fn sink_lost(&self) -> bool {
        self.sink_lost
    }

    pub fn start(&mut self, total_tasks: usize, records: usize) {
        self.emit(RunEvent::new(EVENT_START).with_payload(serde_json::json!({
            "current": 0,
            "total": total_tasks,
            "records": records,
        })));
    }

    /// `current` tasks of `total` have reached a terminal state.
    pub fn progress(&mut self, current: usize, total: usize) {
        self.emit(RunEvent::new(EVENT_PROGRESS).with_payload(serde_json::json!({
            "current": current,
            "total": total,
        })));
    }

    pub fn record_updated(&mut self, record_id: &str, record_index: usize, artifact_refs: &[String]) {
        self.emit(
            RunEvent::new(EVENT_RECORD_UPDATED).with_payload(serde_json::json!({
                "record_id": record_id,
                "record_index": record_index,
                "artifact_refs": artifact_refs,
            })),
        );
    }

    /// Emit the final summary and close the stream.
    pub fn complete(&mut self, summary: &RunSummary) {
        let mut payload = match serde_json::to_value(summary) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize run summary");
                serde_json::json!({})
            }
        };
        if let Some(object) = payload.as_object_mut() {
            object.insert("message".into(), summary.message().into());
        }
        self.finish(RunEvent::new(EVENT_COMPLETE).with_payload(payload));
    }

    /// Report a run-level abort and close the stream.
    pub fn error(&mut self, message: &str) {
        self.finish(RunEvent::new(EVENT_ERROR).with_payload(serde_json::json!({
            "error": message,
        })));
    }

    fn finish(&mut self, event: RunEvent) {
        if self.finished {
            return;
        }
        self.emit(event);
        self.finished = true;
        self.sink.close();
    }

    fn emit(&mut self, event: RunEvent) {
        if self.finished {
            tracing::debug!(event = %event.name, "Skipping event after stream end");
            return;
        }
        if !self.sink.emit(&event) && !self.sink_lost {
            self.sink_lost = true;
            tracing::warn!(event = %event.name, "Event sink closed, continuing run without stream");
        }
    }
}
