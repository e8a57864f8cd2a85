//! Channel-backed notifier for async consumers.

use tokio::sync::mpsc;
use tracing::debug;

use crate::port::outbound::notifier::{Event, Notifier};

/// Forwards events into a tokio channel.
///
/// The engine calls `notify` from synchronous code outside any market lock;
/// the unbounded channel never blocks it. Events sent after the receiver
/// was dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Event>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: Event) {
        if self.sender.send(event).is_err() {
            debug!("Event receiver dropped, discarding event");
        }
    }
}
