//! Per-subscriber bounded event queues and fan-out.

use agentecs_core::ConnectionId;
use agentecs_protocol::ServerEvent;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// The shared registry of live subscriber queues.
///
/// A plain `Arc<DashMap<..>>` rather than an `Arc` around the whole source:
/// fan-out only ever needs this map, and keeping it standalone lets
/// [`Subscription`] release its own entry on drop without holding a
/// reference back to the driver.
pub(crate) type SubscriberMap = Arc<DashMap<ConnectionId, mpsc::Sender<ServerEvent>>>;

/// A single subscriber's event stream.
///
/// Created by [`crate::TickLoopSource::subscribe`]. Dropping a `Subscription`
/// (whether the session ended cleanly or panicked) removes its queue from
/// the shared registry, so a subscriber can never outlive its consumer.
pub struct Subscription {
    id: ConnectionId,
    receiver: mpsc::Receiver<ServerEvent>,
    registry: SubscriberMap,
}

impl Subscription {
    pub(crate) fn new(registry: SubscriberMap, capacity: usize) -> Self {
        let id = ConnectionId::new();
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        registry.insert(id, sender);
        Self { id, receiver, registry }
    }

    /// The identifier this subscription was registered under.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Await the next event on this subscriber's queue.
    ///
    /// Returns `None` once the driver has dropped its sender (disconnect).
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
    }
}

/// Deliver `event` to every live subscriber.
///
/// Non-blocking: a full queue drops the event (and logs a warning) rather
/// than waiting for its consumer, so one slow subscriber can never stall the
/// driver or any other subscriber.
pub(crate) fn fan_out(registry: &SubscriberMap, event: &ServerEvent) {
    for entry in registry.iter() {
        match entry.value().try_send(event.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(connection = %entry.key(), "subscriber queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                // The subscription's Drop impl will remove this entry; the
                // driver does not need to do it here.
            }
        }
    }
}
