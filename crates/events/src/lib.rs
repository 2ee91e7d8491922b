//! Caller-facing event stream of a draft generation run.
//!
//! - [`event`]: the [`RunEvent`] envelope.
//! - [`sink`]: the [`EventSink`] seam and an in-process channel sink.
//! - [`sse`]: Server-Sent Events framing over any writer.
//! - [`reporter`]: [`ProgressReporter`], which shapes payloads and
//!   enforces that nothing follows `complete` or `error`.

pub mod event;
pub mod reporter;
pub mod sink;
pub mod sse;

pub use event::RunEvent;
pub use reporter::ProgressReporter;
pub use sink::{ChannelSink, EventSink};
pub use sse::SseSink;
