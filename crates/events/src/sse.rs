//! Server-Sent Events framing.

use std::io::Write;

use crate::event::RunEvent;
use crate::sink::EventSink;

/// Encode one event as an SSE frame: `event: {name}\ndata: {json}\n\n`.
pub fn format_sse_frame(event: &RunEvent) -> String {
    format!("event: {}\ndata: {}\n\n", event.name, event.payload)
}

/// Writes SSE frames to any [`Write`] (stdout, a socket, a buffer).
pub struct SseSink<W: Write + Send> {
    writer: Option<W>,
}

impl<W: Write + Send> SseSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
        }
    }

    /// Take back the writer, if the sink still holds it.
    pub fn into_inner(self) -> Option<W> {
        self.writer
    }
}

impl<W: Write + Send> EventSink for SseSink<W> {
    fn emit(&mut self, event: &RunEvent) -> bool {
        let Some(writer) = self.writer.as_mut() else {
            return false;
        };
        let frame = format_sse_frame(event);
        let written = writer
            .write_all(frame.as_bytes())
            .and_then(|()| writer.flush());
        if let Err(e) = written {
            tracing::debug!(event = %event.name, error = %e, "SSE writer closed");
            self.writer = None;
            return false;
        }
        true
    }

    fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}
