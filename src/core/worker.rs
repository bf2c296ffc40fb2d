//! # Worker: one slot of the dynamic pool.
//!
//! A [`Worker`] pulls items from the shared input queue, runs the work function on
//! each and sends the outcome to the finisher. It never decides on its own to grow
//! or shrink the pool; it only reacts to the signals the controller and the rest of
//! the run give it.
//!
//! ## Cycle
//! ```text
//! loop {
//!   ├─► try_take() retirement token ─► exit Retired
//!   ├─► kill switch set              ─► exit Killed
//!   ├─► pop(dequeue_timeout)         ─► none: exit Drained
//!   │      (raced against kill switch and private token)
//!   ├─► work(item, config)           (raced against private token)
//!   │      ├─► Ok(output)   → Success
//!   │      ├─► Fail         → Failure (ItemFailed)
//!   │      ├─► panic        → Failure (ItemFailed)
//!   │      ├─► Abort        → trip kill switch, ItemAborted, exit Aborted
//!   │      └─► token fired  → Failure "worker force-retired", exit Forced
//!   └─► send result ─► finisher gone: exit OutputClosed
//! }
//! ```
//!
//! ## Rules
//! - The kill switch never interrupts a work future that already started.
//! - The private token does: forced retirement drops the in-flight future.
//! - An aborted item produces no result.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cancel::{KillSwitch, RetirementChannel};
use crate::core::queue::{Delivery, InputQueue};
use crate::core::summary::Stats;
use crate::core::{panic_message, trip_kill_switch};
use crate::error::WorkError;
use crate::events::{Bus, Event, EventKind, StopReason};
use crate::work::{WorkRef, WorkResult};

/// Message attached to the item that was in flight when a worker was force-retired.
pub(crate) const FORCED_MESSAGE: &str = "worker force-retired";

/// Outcome of processing one item.
enum Step<I, O> {
    Emit(WorkResult<I, O>),
    Abort(String),
    Forced(WorkResult<I, O>),
}

/// Handles shared by every worker of a run.
pub(crate) struct WorkerCtx<I, C, O> {
    pub(crate) input: Arc<InputQueue<I>>,
    pub(crate) output: mpsc::UnboundedSender<Delivery<I, O>>,
    pub(crate) retire: Arc<RetirementChannel>,
    pub(crate) kill: KillSwitch,
    pub(crate) work: WorkRef<I, C, O>,
    pub(crate) config: Arc<C>,
    pub(crate) bus: Bus,
    pub(crate) stats: Arc<Stats>,
    pub(crate) dequeue_timeout: Duration,
}

impl<I, C, O> Clone for WorkerCtx<I, C, O> {
    fn clone(&self) -> Self {
        Self {
            input: Arc::clone(&self.input),
            output: self.output.clone(),
            retire: Arc::clone(&self.retire),
            kill: self.kill.clone(),
            work: Arc::clone(&self.work),
            config: Arc::clone(&self.config),
            bus: self.bus.clone(),
            stats: Arc::clone(&self.stats),
            dequeue_timeout: self.dequeue_timeout,
        }
    }
}

/// One pool slot.
pub(crate) struct Worker<I, C, O> {
    id: u64,
    ctx: WorkerCtx<I, C, O>,
}

impl<I, C, O> Worker<I, C, O>
where
    I: Clone + Send + 'static,
    C: Send + Sync + 'static,
    O: Send + 'static,
{
    pub(crate) fn new(id: u64, ctx: WorkerCtx<I, C, O>) -> Self {
        Self { id, ctx }
    }

    /// Runs the worker until one of its exit conditions holds.
    pub(crate) async fn run(self, token: CancellationToken) -> StopReason {
        let stop = self.cycle(&token).await;

        match stop {
            StopReason::Retired => Stats::bump(&self.ctx.stats.workers_retired),
            StopReason::Forced => Stats::bump(&self.ctx.stats.workers_forced),
            _ => {}
        }
        self.ctx.bus.publish(
            Event::new(EventKind::WorkerStopped)
                .with_worker(self.id)
                .with_stop(stop),
        );
        stop
    }

    async fn cycle(&self, token: &CancellationToken) -> StopReason {
        let ctx = &self.ctx;
        loop {
            if ctx.retire.try_take() {
                return StopReason::Retired;
            }
            if ctx.kill.is_set() {
                return StopReason::Killed;
            }

            let item = tokio::select! {
                biased;
                _ = ctx.kill.triggered() => return StopReason::Killed,
                _ = token.cancelled() => return StopReason::Forced,
                next = ctx.input.pop(ctx.dequeue_timeout) => match next {
                    Some(item) => item,
                    None => return StopReason::Drained,
                },
            };

            let (result, exit) = match self.process(item, token).await {
                Step::Emit(result) => (result, None),
                Step::Forced(result) => (result, Some(StopReason::Forced)),
                Step::Abort(reason) => {
                    Stats::bump(&ctx.stats.items_aborted);
                    ctx.bus.publish(
                        Event::new(EventKind::ItemAborted)
                            .with_worker(self.id)
                            .with_reason(reason.as_str()),
                    );
                    trip_kill_switch(&ctx.kill, &ctx.bus, format!("item aborted: {reason}"));
                    return StopReason::Aborted;
                }
            };

            let failed = result.is_failure();
            if ctx.output.send(Delivery::Result(result)).is_err() {
                return StopReason::OutputClosed;
            }
            Stats::bump(&ctx.stats.results_emitted);
            if failed {
                Stats::bump(&ctx.stats.results_failed);
            }
            if let Some(stop) = exit {
                return stop;
            }
        }
    }

    async fn process(&self, item: I, token: &CancellationToken) -> Step<I, O> {
        let ctx = &self.ctx;
        let attempt = {
            let item = item.clone();
            let work = Arc::clone(&ctx.work);
            let config = Arc::clone(&ctx.config);
            // the call itself runs inside the guarded future so a panicking
            // closure is caught like a panicking future
            AssertUnwindSafe(async move { work.call(item, config).await }).catch_unwind()
        };

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => {
                return Step::Forced(WorkResult::failure(item, FORCED_MESSAGE, ""));
            }
            outcome = attempt => outcome,
        };

        match outcome {
            Ok(Ok(output)) => Step::Emit(WorkResult::success(item, output)),
            Ok(Err(WorkError::Abort { reason })) => Step::Abort(reason),
            Ok(Err(WorkError::Fail {
                message,
                diagnostic,
            })) => {
                self.item_failed(&message);
                Step::Emit(WorkResult::failure(item, message, diagnostic))
            }
            Err(panic_err) => {
                let info = panic_message(&*panic_err);
                let message = format!("work function panicked: {info}");
                self.item_failed(&message);
                Step::Emit(WorkResult::failure(item, message, info))
            }
        }
    }

    fn item_failed(&self, message: &str) {
        self.ctx.bus.publish(
            Event::new(EventKind::ItemFailed)
                .with_worker(self.id)
                .with_reason(message),
        );
    }
}
