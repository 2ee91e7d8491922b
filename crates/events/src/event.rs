use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One event of the run stream.
///
/// `name` is one of the `draftgen_core::run_events::EVENT_*` constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub name: String,

    /// Event-specific JSON body.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl RunEvent {
    /// Create an event with an empty object payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Whether this event closes the stream.
    pub fn is_terminal(&self) -> bool {
        draftgen_core::run_events::is_terminal_event(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use draftgen_core::run_events::{EVENT_COMPLETE, EVENT_ERROR, EVENT_PROGRESS};

    use super::*;

    #[test]
    fn new_event_has_empty_object_payload() {
        let event = RunEvent::new(EVENT_PROGRESS);
        assert_eq!(event.payload, serde_json::json!({}));
        assert!(!event.is_terminal());
    }

    #[test]
    fn complete_and_error_are_terminal() {
        assert!(RunEvent::new(EVENT_COMPLETE).is_terminal());
        assert!(RunEvent::new(EVENT_ERROR).is_terminal());
    }
}
