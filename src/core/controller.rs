//! # Controller: the sizing loop.
//!
//! Runs in the caller's task for the whole run. Once per `poll_period` it asks the
//! sizing function for a target and reconciles the pool against it; once the input
//! is exhausted (or the kill switch is set) it only waits for the remaining workers.
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► input non-empty && kill unset:
//!   │     target = clamp(sizer(&config))
//!   │     prune roster
//!   │     spawn while live < target            → WorkerStarted
//!   │     live > target:
//!   │        issue(live - target)              → RetirementIssued
//!   │        drained(retire_timeout)?
//!   │          └─ timeout: revoke + force newest → RetirementStalled
//!   │        join the workers that took a token
//!   │     sleep until next tick (or kill)
//!   └─► otherwise:
//!         prune; no worker alive → return
//!         wait for next tick or next worker exit
//! }
//! ```
//!
//! ## Rules
//! - Completion is "input empty (or killed) and no live worker", never a counter.
//! - No worker is spawned once the kill switch is set.
//! - Retirement never over-retires: a shrink by `k` retires exactly `k` workers,
//!   either through tokens or, after a stall, through forced cancellation.
//! - Retiring workers never count as live, so the next tick does not shrink again
//!   on their account.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use tokio::time::{Instant, sleep_until};

use crate::config::ExecutorConfig;
use crate::core::roster::Roster;
use crate::core::summary::Stats;
use crate::core::worker::{Worker, WorkerCtx};
use crate::core::{panic_message, trip_kill_switch};
use crate::events::{Event, EventKind};
use crate::work::SizerRef;

pub(crate) struct Controller<I, C, O> {
    cfg: ExecutorConfig,
    sizer: SizerRef<C>,
    ctx: WorkerCtx<I, C, O>,
    roster: Roster,
    next_id: u64,
}

impl<I, C, O> Controller<I, C, O>
where
    I: Clone + Send + 'static,
    C: Send + Sync + 'static,
    O: Send + 'static,
{
    pub(crate) fn new(cfg: ExecutorConfig, sizer: SizerRef<C>, ctx: WorkerCtx<I, C, O>) -> Self {
        Self {
            cfg,
            sizer,
            ctx,
            roster: Roster::new(),
            next_id: 0,
        }
    }

    /// Drives the pool until the run is complete.
    pub(crate) async fn drive(&mut self) {
        loop {
            let deadline = Instant::now() + self.cfg.poll_period;

            if self.has_work() {
                self.reconcile().await;
                tokio::select! {
                    _ = sleep_until(deadline) => {}
                    _ = self.ctx.kill.triggered() => {}
                }
            } else {
                self.roster.prune();
                if self.roster.is_empty() {
                    return;
                }
                self.roster.next_exit_until(deadline).await;
            }
        }
    }

    fn has_work(&self) -> bool {
        !self.ctx.kill.is_set() && !self.ctx.input.is_empty()
    }

    async fn reconcile(&mut self) {
        let Some(target) = self.target() else {
            return;
        };
        let live = self.roster.prune();
        if live != target {
            self.ctx.bus.publish(
                Event::new(EventKind::PoolResized)
                    .with_target(target)
                    .with_count(live),
            );
        }

        while self.roster.len() < target && !self.ctx.kill.is_set() {
            self.spawn_worker();
        }
        self.ctx.stats.observe_live(self.roster.len());

        let excess = self.roster.len().saturating_sub(target);
        if excess > 0 {
            self.retire(excess).await;
        }
        self.roster.prune();
    }

    /// Evaluates the sizing function; a panic trips the kill switch.
    fn target(&self) -> Option<usize> {
        let sizer = &self.sizer;
        let config = self.ctx.config.as_ref();
        match std::panic::catch_unwind(AssertUnwindSafe(|| sizer.target(config))) {
            Ok(target) => Some(self.cfg.clamp_target(target)),
            Err(panic_err) => {
                let reason = format!("sizing function panicked: {}", panic_message(&*panic_err));
                trip_kill_switch(&self.ctx.kill, &self.ctx.bus, reason);
                None
            }
        }
    }

    fn spawn_worker(&mut self) {
        self.next_id += 1;
        let id = self.next_id;

        Stats::bump(&self.ctx.stats.workers_started);
        self.ctx
            .bus
            .publish(Event::new(EventKind::WorkerStarted).with_worker(id));

        let worker = Worker::new(id, self.ctx.clone());
        self.roster.spawn(id, move |token| worker.run(token));
    }

    /// Retires exactly `excess` workers.
    ///
    /// Returns once every retired worker is gone from the live count: token holders
    /// have been joined and force-retired workers are cancelled.
    async fn retire(&mut self, excess: usize) {
        let retire = Arc::clone(&self.ctx.retire);
        let joined_before = self.roster.retired();
        retire.issue(excess);
        self.ctx.bus.publish(
            Event::new(EventKind::RetirementIssued).with_count(excess),
        );

        let drained = tokio::select! {
            biased;
            _ = self.ctx.kill.triggered() => {
                retire.revoke();
                return;
            }
            drained = retire.drained(self.cfg.retire_timeout) => drained,
        };

        let stalled = if drained { 0 } else { retire.revoke() };
        if stalled > 0 {
            self.ctx.bus.publish(
                Event::new(EventKind::RetirementStalled).with_count(stalled),
            );
            self.roster.force_retire(stalled);
        }

        // token holders exit right after the take; wait until they are joined
        let taken = excess - stalled;
        let deadline = Instant::now() + self.cfg.retire_timeout;
        self.roster.wait_retired(joined_before + taken, deadline).await;
    }
}
