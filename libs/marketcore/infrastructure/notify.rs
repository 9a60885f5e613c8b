//! Notification sinks.
//!
//! The engines hand every [`DomainEvent`] to a sink and move on;
//! persistence and delivery (push, in-app panel) are the consumer's
//! concern. Publication is fire-and-forget and must never fail a
//! business operation.

use crossbeam_channel::{unbounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::domain::events::DomainEvent;

/// Consumer of domain events.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

/// Discards every event. Useful when a caller only wants return values.
#[derive(Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn publish(&self, _event: DomainEvent) {}
}

/// Buffers events in memory for later inspection. Test helper.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<DomainEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl NotificationSink for MemorySink {
    fn publish(&self, event: DomainEvent) {
        self.events.lock().push(event);
    }
}

/// Forwards events over a channel to a delivery worker.
///
/// A disconnected receiver drops the event with a warning; the business
/// operation that produced it has already committed.
pub struct ChannelSink {
    tx: Sender<DomainEvent>,
}

impl ChannelSink {
    /// Create a sink together with the receiving end for the worker.
    pub fn new() -> (Self, Receiver<DomainEvent>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn publish(&self, event: DomainEvent) {
        if let Err(TrySendError::Disconnected(event)) = self.tx.try_send(event) {
            warn!(event = event.name(), "notification receiver gone, event dropped");
        }
    }
}

/// Logs each rendered notification. Handy for demos and local runs.
#[derive(Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn publish(&self, event: DomainEvent) {
        let n = event.notification();
        info!(
            recipient = %n.recipient_id,
            kind = ?n.kind,
            "{}: {}",
            n.title,
            n.body
        );
    }
}
