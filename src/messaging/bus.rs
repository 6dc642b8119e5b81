/// Broadcast bus for presentation subscribers
///
/// Subscribers get their own channel, so a slow or stalled subscriber never
/// blocks the consumer thread publishing on the bus.
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use super::events::Event;

/// Handle identifying one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

struct Subscriber {
    id: SubscriberId,
    sender: Sender<Event>,
}

struct Inner {
    subscribers: Vec<Subscriber>,
    next_id: usize,
}

/// Event bus broadcasting notifications to all subscribers
pub struct EventBus {
    inner: Arc<Mutex<Inner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Subscribe to events, returns a receiver and subscription ID
    pub fn subscribe(&self) -> (Receiver<Event>, SubscriberId) {
        let (tx, rx) = unbounded();

        let mut inner = self.inner.lock();
        let id = SubscriberId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push(Subscriber { id, sender: tx });

        (rx, id)
    }

    /// Unsubscribe from events
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.inner.lock().subscribers.retain(|s| s.id != id);
    }

    /// Publish an event to all subscribers without blocking.
    /// A failed send means the subscriber dropped its receiver; it gets
    /// pruned on the next publish.
    pub fn publish(&self, event: Event) {
        let mut inner = self.inner.lock();
        inner
            .subscribers
            .retain(|s| s.sender.send(event.clone()).is_ok());
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
