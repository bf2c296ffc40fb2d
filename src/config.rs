//! # Executor configuration.
//!
//! Provides [`ExecutorConfig`], the centralized settings for the executor runtime.
//! The caller's own configuration value (shared with the sizing function, work
//! function and handler) is a separate, typed `C` passed through [`RunSpec`](crate::RunSpec).
//!
//! ## Sentinel values
//! - `max_workers = 0` → unlimited (the sizing function alone decides)
//!
//! All durations must be non-zero; [`ExecutorConfig::validate`] is called by the
//! executor before any queue or task is created.

use std::time::Duration;

use crate::error::RuntimeError;

/// Configuration for the executor runtime.
///
/// ## Field semantics
/// - `poll_period`: time between two sizing decisions
/// - `dequeue_timeout`: how long an idle worker waits for an item before exiting
/// - `retire_timeout`: how long the controller waits for issued retirement tokens
///   to be consumed before force-retiring workers
/// - `max_workers`: hard cap applied to the sizing function (`0` = unlimited)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `handle_signals`: trip the kill switch on SIGINT/SIGTERM/SIGQUIT (Ctrl-C)
///
/// ## Notes
/// All fields are public. Prefer the helper accessors to avoid sprinkling sentinel
/// checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct ExecutorConfig {
    /// Period of the controller loop.
    ///
    /// The sizing function is evaluated at most once per period. When the input
    /// queue is empty the controller also wakes up early on every worker exit.
    pub poll_period: Duration,

    /// Bounded wait of a worker on the input queue.
    ///
    /// The input queue is sealed after loading, so an empty queue ends a worker
    /// immediately; the timeout only matters while loading is still in progress.
    pub dequeue_timeout: Duration,

    /// Maximum wait for retirement tokens to be consumed.
    ///
    /// When exceeded, unconsumed tokens are revoked and the same number of workers
    /// is cancelled through their per-worker tokens.
    pub retire_timeout: Duration,

    /// Upper bound for the pool size.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = the sizing target is clamped to `n`
    pub max_workers: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages skip
    /// older items. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,

    /// Listen for OS termination signals during a run and trip the kill switch.
    pub handle_signals: bool,
}

impl ExecutorConfig {
    /// Returns the pool size cap as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` workers
    #[inline]
    pub fn worker_limit(&self) -> Option<usize> {
        if self.max_workers == 0 {
            None
        } else {
            Some(self.max_workers)
        }
    }

    /// Applies [`worker_limit`](Self::worker_limit) to a sizing target.
    #[inline]
    pub fn clamp_target(&self, target: usize) -> usize {
        match self.worker_limit() {
            Some(limit) => target.min(limit),
            None => target,
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Checks the configuration; returns [`RuntimeError::Config`] on the first problem.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.poll_period.is_zero() {
            return Err(RuntimeError::non_zero("poll_period", self.poll_period));
        }
        if self.dequeue_timeout.is_zero() {
            return Err(RuntimeError::non_zero(
                "dequeue_timeout",
                self.dequeue_timeout,
            ));
        }
        if self.retire_timeout.is_zero() {
            return Err(RuntimeError::non_zero("retire_timeout", self.retire_timeout));
        }
        Ok(())
    }
}

impl Default for ExecutorConfig {
    /// Default configuration:
    ///
    /// - `poll_period = 1s`
    /// - `dequeue_timeout = 5s`
    /// - `retire_timeout = 60s`
    /// - `max_workers = 0` (unlimited)
    /// - `bus_capacity = 1024`
    /// - `handle_signals = false`
    fn default() -> Self {
        Self {
            poll_period: Duration::from_secs(1),
            dequeue_timeout: Duration::from_secs(5),
            retire_timeout: Duration::from_secs(60),
            max_workers: 0,
            bus_capacity: 1024,
            handle_signals: false,
        }
    }
}
