//! # Run summary.
//!
//! [`RunSummary`] is the value returned by a completed run. Workers, the finisher
//! and the controller update a shared [`Stats`] block while the run is in
//! progress; the summary is a snapshot taken after every task stopped.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Live counters shared by the run's tasks.
#[derive(Debug, Default)]
pub(crate) struct Stats {
    pub(crate) workers_started: AtomicUsize,
    pub(crate) workers_retired: AtomicUsize,
    pub(crate) workers_forced: AtomicUsize,
    pub(crate) results_emitted: AtomicUsize,
    pub(crate) results_failed: AtomicUsize,
    pub(crate) items_aborted: AtomicUsize,
    pub(crate) peak_workers: AtomicUsize,
}

impl Stats {
    #[inline]
    pub(crate) fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn observe_live(&self, live: usize) {
        self.peak_workers.fetch_max(live, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(
        &self,
        items_loaded: usize,
        results_handled: usize,
        killed: Option<String>,
    ) -> RunSummary {
        let get = |c: &AtomicUsize| c.load(Ordering::Relaxed);
        RunSummary {
            items_loaded,
            workers_started: get(&self.workers_started),
            workers_retired: get(&self.workers_retired),
            workers_forced: get(&self.workers_forced),
            peak_workers: get(&self.peak_workers),
            results_emitted: get(&self.results_emitted),
            results_failed: get(&self.results_failed),
            results_handled,
            items_aborted: get(&self.items_aborted),
            killed,
        }
    }
}

/// Counters describing one finished run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Items in the input queue after the start hook ran.
    pub items_loaded: usize,
    /// Worker tasks spawned over the whole run.
    pub workers_started: usize,
    /// Workers that exited by consuming a retirement token.
    pub workers_retired: usize,
    /// Workers cancelled after a stalled retirement.
    pub workers_forced: usize,
    /// Largest number of live workers observed by the controller.
    pub peak_workers: usize,
    /// Results sent by workers (successes and failures).
    pub results_emitted: usize,
    /// Of `results_emitted`, how many were failures.
    pub results_failed: usize,
    /// Handler invocations.
    pub results_handled: usize,
    /// Items whose work function raised the abort signal.
    pub items_aborted: usize,
    /// Kill reason, when the kill switch fired.
    pub killed: Option<String>,
}

impl RunSummary {
    /// Returns `true` if the run ended because the kill switch fired.
    pub fn was_killed(&self) -> bool {
        self.killed.is_some()
    }

    /// Returns `true` if every loaded item was handled and nothing was aborted.
    pub fn is_complete(&self) -> bool {
        self.killed.is_none() && self.results_handled == self.items_loaded
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "items={} handled={} failed={} aborted={} workers(started={} retired={} forced={} peak={})",
            self.items_loaded,
            self.results_handled,
            self.results_failed,
            self.items_aborted,
            self.workers_started,
            self.workers_retired,
            self.workers_forced,
            self.peak_workers,
        )?;
        if let Some(reason) = &self.killed {
            write!(f, " killed={reason}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_copies_counters() {
        let stats = Stats::default();
        Stats::bump(&stats.workers_started);
        Stats::bump(&stats.workers_started);
        Stats::bump(&stats.results_emitted);
        stats.observe_live(2);
        stats.observe_live(1);

        let s = stats.snapshot(1, 1, None);
        assert_eq!(s.workers_started, 2);
        assert_eq!(s.peak_workers, 2);
        assert!(s.is_complete());
        assert!(!s.was_killed());
    }

    #[test]
    fn display_mentions_kill_reason() {
        let s = RunSummary {
            killed: Some("item 2".into()),
            ..RunSummary::default()
        };
        assert!(s.to_string().ends_with("killed=item 2"));
        assert!(!s.is_complete());
    }
}
