//! # Runtime events emitted by the controller, workers and finisher.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Run events**: start and end of a run
//! - **Pool events**: sizing decisions, worker start/stop, retirement
//! - **Item events**: per-item failures and aborts
//! - **Subscriber events**: overflow and panics inside subscribers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, worker id,
//! sizing target, counters and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use dynexec::{Event, EventKind, StopReason};
//!
//! let ev = Event::new(EventKind::WorkerStopped)
//!     .with_worker(3)
//!     .with_stop(StopReason::Retired);
//!
//! assert_eq!(ev.kind, EventKind::WorkerStopped);
//! assert_eq!(ev.worker, Some(3));
//! assert_eq!(ev.stop, Some(StopReason::Retired));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: subscriber name and panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: subscriber name and cause ("full", "closed")
    SubscriberOverflow,

    // === Run events ===
    /// Validation passed and the input queue is loaded.
    ///
    /// Sets:
    /// - `count`: number of loaded items
    RunStarting,

    /// All workers and the finisher stopped; the finish hook (if any) ran.
    ///
    /// Sets:
    /// - `count`: number of handled results
    /// - `reason`: kill reason, when the run was aborted
    RunFinished,

    // === Pool events ===
    /// A sizing decision was applied.
    ///
    /// Sets:
    /// - `target`: clamped sizing target
    /// - `count`: live workers before reconciliation
    PoolResized,

    /// A worker task was spawned.
    ///
    /// Sets:
    /// - `worker`: worker id (1-based, unique per run)
    WorkerStarted,

    /// A worker task exited.
    ///
    /// Sets:
    /// - `worker`: worker id
    /// - `stop`: why it exited
    WorkerStopped,

    /// Retirement tokens were issued to shrink the pool.
    ///
    /// Sets:
    /// - `count`: number of tokens issued
    RetirementIssued,

    /// Issued tokens were not consumed within `retire_timeout`; workers are force-retired.
    ///
    /// Sets:
    /// - `count`: number of revoked tokens (= workers force-retired)
    RetirementStalled,

    // === Item events ===
    /// The work function failed for one item (the failure is also delivered to the handler).
    ///
    /// Sets:
    /// - `worker`: worker id
    /// - `reason`: failure message
    ItemFailed,

    /// The work function raised the abort signal; the item produces no result.
    ///
    /// Sets:
    /// - `worker`: worker id
    /// - `reason`: abort reason
    ItemAborted,

    // === Shutdown events ===
    /// The kill switch was tripped (first trigger only).
    ///
    /// Sets:
    /// - `reason`: kill reason
    KillSwitchTriggered,

    /// The finisher stopped.
    ///
    /// Sets:
    /// - `count`: number of handled results
    /// - `reason`: "done", "killed", or the handler error
    FinisherStopped,
}

/// Why a worker exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Consumed a retirement token (planned scale-down).
    Retired,
    /// Observed the kill switch.
    Killed,
    /// Cancelled through its own token after a stalled retirement.
    Forced,
    /// No more input.
    Drained,
    /// Its work function raised the abort signal.
    Aborted,
    /// The finisher is gone; results can no longer be delivered.
    OutputClosed,
}

impl StopReason {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StopReason::Retired => "retired",
            StopReason::Killed => "killed",
            StopReason::Forced => "forced",
            StopReason::Drained => "drained",
            StopReason::Aborted => "aborted",
            StopReason::OutputClosed => "output_closed",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Worker id, if applicable.
    pub worker: Option<u64>,
    /// Sizing target, if applicable.
    pub target: Option<usize>,
    /// Generic counter (items, tokens, workers), see [`EventKind`].
    pub count: Option<usize>,
    /// Worker exit reason.
    pub stop: Option<StopReason>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            target: None,
            count: None,
            stop: None,
            reason: None,
        }
    }

    /// Attaches a worker id.
    #[inline]
    pub fn with_worker(mut self, id: u64) -> Self {
        self.worker = Some(id);
        self
    }

    /// Attaches a sizing target.
    #[inline]
    pub fn with_target(mut self, target: usize) -> Self {
        self.target = Some(target);
        self
    }

    /// Attaches a counter.
    #[inline]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Attaches a worker exit reason.
    #[inline]
    pub fn with_stop(mut self, stop: StopReason) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::WorkerStarted);
        let b = Event::new(EventKind::WorkerStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn overflow_event_names_the_subscriber() {
        let ev = Event::subscriber_overflow("metrics", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.reason.as_deref(), Some("subscriber=metrics reason=full"));
    }
}
