//! Destinations for run events.

use tokio::sync::mpsc;

use crate::event::RunEvent;

/// Where a run writes its events.
///
/// `emit` returns `false` once the destination has gone away (client
/// disconnected, receiver dropped). The run treats that as advisory and
/// keeps going.
pub trait EventSink: Send {
    fn emit(&mut self, event: &RunEvent) -> bool;

    /// Release the destination. Later `emit` calls return `false`.
    fn close(&mut self);
}

/// Forwards events over an unbounded tokio channel.
pub struct ChannelSink {
    sender: Option<mpsc::UnboundedSender<RunEvent>>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::UnboundedSender<RunEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Create a sink together with the receiving half.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: &RunEvent) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };
        if sender.send(event.clone()).is_err() {
            // Receiver dropped.
            self.sender = None;
            return false;
        }
        true
    }

    fn close(&mut self) {
        self.sender = None;
    }
}
