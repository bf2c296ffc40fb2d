//! # Run-scoped event bus.
//!
//! Every [`Executor::run`](crate::Executor::run) creates its own [`Bus`]; it lives
//! exactly as long as the run. The controller, the workers, the finisher and the
//! subscriber set publish into it, and a single run listener forwards what it
//! receives to the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//! controller ─┐
//! worker 1..N ┼─► Bus ─► run listener ─► SubscriberSet ─► Subscribe::on_event
//! finisher  ──┘
//! ```
//!
//! Publishing is a plain `broadcast::Sender::send`: it never waits, and with no
//! receiver (a run without subscribers) the event is simply dropped. The ring
//! buffer holds `bus_capacity` events; a listener that falls further behind skips
//! the oldest ones.

use tokio::sync::broadcast;

use super::event::Event;

/// Publisher handle for the events of one run. Clones share the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus buffering up to `capacity` events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes `ev`; dropped when nobody listens.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
