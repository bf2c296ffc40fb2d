//! # LogWriter: forwards runtime events to `tracing`
//!
//! A subscriber that turns each [`Event`] into one structured `tracing` record.
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Levels
//! - `warn`: item aborts, kill switch, stalled retirement, subscriber overflow/panic
//! - `info`: run start/finish, pool resizes, finisher stop
//! - `debug`: worker start/stop, retirement issued, item failures

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::RunStarting => {
                info!(seq = e.seq, items = e.count, "run starting");
            }
            EventKind::RunFinished => {
                info!(seq = e.seq, handled = e.count, killed = reason, "run finished");
            }
            EventKind::PoolResized => {
                info!(seq = e.seq, size = e.target, live = e.count, "pool resized");
            }
            EventKind::WorkerStarted => {
                debug!(seq = e.seq, worker = e.worker, "worker started");
            }
            EventKind::WorkerStopped => {
                debug!(
                    seq = e.seq,
                    worker = e.worker,
                    stop = e.stop.map(|s| s.as_label()),
                    "worker stopped"
                );
            }
            EventKind::RetirementIssued => {
                debug!(seq = e.seq, tokens = e.count, "retirement issued");
            }
            EventKind::RetirementStalled => {
                warn!(seq = e.seq, forced = e.count, "retirement stalled, forcing workers");
            }
            EventKind::ItemFailed => {
                debug!(seq = e.seq, worker = e.worker, err = reason, "item failed");
            }
            EventKind::ItemAborted => {
                warn!(seq = e.seq, worker = e.worker, reason, "item aborted the run");
            }
            EventKind::KillSwitchTriggered => {
                warn!(seq = e.seq, reason, "kill switch triggered");
            }
            EventKind::FinisherStopped => {
                info!(seq = e.seq, handled = e.count, reason, "finisher stopped");
            }
            EventKind::SubscriberOverflow => {
                warn!(seq = e.seq, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                warn!(seq = e.seq, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
