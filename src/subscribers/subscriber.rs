//! # Run observers.
//!
//! [`Subscribe`] is how callers watch a run: pool resizes, worker exits, failed or
//! aborted items, the kill switch firing. Subscribers are registered once on the
//! [`ExecutorBuilder`](crate::ExecutorBuilder) and see the events of every run.
//!
//! Within one run a subscriber receives events in the order the run listener
//! forwarded them, one at a time, from its own task. Its queue holds
//! [`queue_capacity`](Subscribe::queue_capacity) events; when full, new events are
//! dropped for that subscriber and a `SubscriberOverflow` event names it. A panic in
//! [`on_event`](Subscribe::on_event) is reported as `SubscriberPanicked` and the
//! subscriber keeps receiving. `Executor::run` returns only after every subscriber
//! processed what was queued for it.

use async_trait::async_trait;

use crate::events::Event;

/// Observer of run events.
///
/// `on_event` runs off the hot path, but a slow implementation still overflows its
/// own queue, so keep it short or hand work off.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name used in `SubscriberOverflow` and `SubscriberPanicked` reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Events buffered for this subscriber before new ones are dropped (at least 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
