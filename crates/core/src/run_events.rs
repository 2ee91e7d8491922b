//! Event names of the caller-facing run stream.
//!
//! Used by `draftgen-events` when emitting and by consumers when parsing
//! the stream.

/// Run accepted; carries the total task count.
pub const EVENT_START: &str = "start";

/// A task reached a terminal state (running count + total).
pub const EVENT_PROGRESS: &str = "progress";

/// A record committed all of its artifacts downstream.
pub const EVENT_RECORD_UPDATED: &str = "record_updated";

/// Final summary. Closes the stream.
pub const EVENT_COMPLETE: &str = "complete";

/// The run aborted before completing. Closes the stream.
pub const EVENT_ERROR: &str = "error";

/// Whether an event of this name ends the stream.
pub fn is_terminal_event(name: &str) -> bool {
    name == EVENT_COMPLETE || name == EVENT_ERROR
}
