//! # Worker roster.
//!
//! Controller-private bookkeeping of live workers. Each entry owns the worker's
//! private [`CancellationToken`] (used only for forced retirement) and the abort
//! handle of its task in the [`JoinSet`].
//!
//! ## Rules
//! - Worker ids are assigned by the controller and increase monotonically, so
//!   the highest id is the newest worker.
//! - [`Roster::prune`] drops finished workers; it never blocks.
//! - [`Roster::force_retire`] cancels the newest live workers first.
//! - A worker whose private token is cancelled is leaving: it is no longer counted
//!   as live even though its task may still be unwinding.
//! - Every joined exit is recorded, so the controller can wait for the workers that
//!   consumed retirement tokens without counting them twice.

use std::collections::BTreeMap;
use std::future::Future;

use tokio::task::{AbortHandle, JoinError, JoinSet};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::events::StopReason;

struct Entry {
    token: CancellationToken,
    task: AbortHandle,
}

/// Live workers of one run.
pub(crate) struct Roster {
    set: JoinSet<StopReason>,
    entries: BTreeMap<u64, Entry>,
    retired: usize,
}

impl Roster {
    pub(crate) fn new() -> Self {
        Self {
            set: JoinSet::new(),
            entries: BTreeMap::new(),
            retired: 0,
        }
    }

    /// Spawns a worker with a fresh private token.
    pub(crate) fn spawn<F, Fut>(&mut self, id: u64, worker: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = StopReason> + Send + 'static,
    {
        let token = CancellationToken::new();
        let task = self.set.spawn(worker(token.clone()));
        self.entries.insert(id, Entry { token, task });
    }

    /// Forgets finished workers; returns the number still live.
    pub(crate) fn prune(&mut self) -> usize {
        while let Some(joined) = self.set.try_join_next() {
            self.record(joined);
        }
        self.entries.retain(|_, e| !e.task.is_finished());
        self.len()
    }

    /// Workers that are neither finished nor leaving.
    pub(crate) fn len(&self) -> usize {
        self.entries
            .values()
            .filter(|e| !e.token.is_cancelled() && !e.task.is_finished())
            .count()
    }

    /// `true` when no worker task is left at all, leaving ones included.
    pub(crate) fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Number of joined workers that exited through a retirement token.
    pub(crate) fn retired(&self) -> usize {
        self.retired
    }

    fn record(&mut self, joined: Result<StopReason, JoinError>) {
        if matches!(joined, Ok(StopReason::Retired)) {
            self.retired += 1;
        }
    }

    /// Cancels the private tokens of up to `n` live workers, newest first.
    ///
    /// Returns how many workers were cancelled.
    pub(crate) fn force_retire(&mut self, n: usize) -> usize {
        let mut cancelled = 0;
        for entry in self.entries.values().rev() {
            if cancelled == n {
                break;
            }
            if entry.task.is_finished() || entry.token.is_cancelled() {
                continue;
            }
            entry.token.cancel();
            cancelled += 1;
        }
        cancelled
    }

    /// Waits until one worker exits or `deadline` passes, whichever comes first.
    pub(crate) async fn next_exit_until(&mut self, deadline: Instant) {
        if self.set.is_empty() {
            sleep_until(deadline).await;
            return;
        }
        tokio::select! {
            Some(joined) = self.set.join_next() => self.record(joined),
            _ = sleep_until(deadline) => {}
        }
    }

    /// Joins exits until [`retired`](Roster::retired) reaches `count` or `deadline` passes.
    ///
    /// Returns `true` when the count was reached.
    pub(crate) async fn wait_retired(&mut self, count: usize, deadline: Instant) -> bool {
        while self.retired < count {
            tokio::select! {
                joined = self.set.join_next() => match joined {
                    Some(joined) => self.record(joined),
                    None => break,
                },
                _ = sleep_until(deadline) => break,
            }
        }
        self.entries.retain(|_, e| !e.task.is_finished());
        self.retired >= count
    }

    /// Waits for every remaining worker.
    #[cfg(test)]
    pub(crate) async fn join_all(&mut self) {
        while self.set.join_next().await.is_some() {}
        self.entries.clear();
    }
}
