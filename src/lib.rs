//! # dynexec
//!
//! **dynexec** runs one work function over a finite set of items with a pool of
//! async workers whose size is re-decided at runtime by a caller-supplied sizing
//! function. Every outcome is passed, one at a time, to a single result handler.
//!
//! The pool grows by spawning workers and shrinks by issuing retirement tokens that
//! idle workers consume between items. Either the work function or the handler can
//! stop the whole run early through an abort signal (the kill switch).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     items ──► on_start(&mut items, &mut config) ──► InputQueue (sealed)
//!                                                          │
//! ┌────────────────────────────────────────────┐          │ pop(dequeue_timeout)
//! │  Controller (caller's task)                │          ▼
//! │  every poll_period:                        │    ┌──────────┐ ┌──────────┐
//! │    target = sizer(&config)                 │───►│ Worker 1 │ │ Worker N │
//! │    spawn while live < target               │    └────┬─────┘ └────┬─────┘
//! │    retire(live - target) via tokens        │         │ WorkResult │
//! │  done when input empty && no live worker   │         ▼            ▼
//! └────────────────────┬───────────────────────┘   ┌─────────────────────┐
//!                      │ Done                      │   OutputChannel     │
//!                      └──────────────────────────►│   (MPSC, FIFO)      │
//!                                                  └──────────┬──────────┘
//!                                                             ▼
//!                                                  ┌─────────────────────┐
//!                                                  │ Finisher            │
//!                                                  │ handler(result, cfg)│
//!                                                  └─────────────────────┘
//!
//!  KillSwitch: tripped by WorkError::Abort, HandleError::Abort, handler defects
//!              or OS signals; every task observes it.
//! ```
//!
//! ### Events
//! ```text
//!  Controller / Worker / Finisher ── publish(Event) ──► Bus (broadcast)
//!                                                         │
//!                                                    run listener
//!                                                         ▼
//!                                                   SubscriberSet
//!                                              ┌──────────┼──────────┐
//!                                              ▼          ▼          ▼
//!                                          LogWriter   metrics    custom
//! ```
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                         |
//! |-------------------|------------------------------------------------------------|--------------------------------------------|
//! | **Execution**     | Run a pool against a spec, async or blocking.              | [`Executor`], [`RunSpec`], [`execute`]     |
//! | **Callables**     | Work function, result handler, sizing function.            | [`Work`], [`Handle`], [`Sizer`]            |
//! | **Results**       | Tagged per-item outcome and run counters.                  | [`WorkResult`], [`RunSummary`]             |
//! | **Cancellation**  | Run-wide kill switch and targeted retirement tokens.       | [`KillSwitch`], [`RetirementChannel`]      |
//! | **Subscriber API**| Hook into runtime events (logging, metrics, custom).       | [`Subscribe`], [`Event`], [`EventKind`]    |
//! | **Errors**        | Typed errors for the runtime, work and handler.            | [`RuntimeError`], [`WorkError`], [`HandleError`] |
//! | **Configuration** | Centralize runtime settings.                               | [`ExecutorConfig`]                         |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] subscriber, which
//!   forwards events to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//! use dynexec::{Executor, ExecutorConfig, HandleError, RunSpec, WorkError, WorkResult};
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = ExecutorConfig::default();
//!     cfg.poll_period = Duration::from_millis(50);
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn dynexec::Subscribe>> = vec![Arc::new(dynexec::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn dynexec::Subscribe>> = Vec::new();
//!
//!     let exec = Executor::builder(cfg).with_subscribers(subs).build();
//!
//!     // The pool width lives in the run configuration and may change while running.
//!     let width = Arc::new(AtomicUsize::new(3));
//!     let spec = RunSpec::new(
//!         1..=10u64,
//!         Arc::clone(&width),
//!         |w: &Arc<AtomicUsize>| w.load(Ordering::Relaxed),
//!         |x: u64, _cfg: Arc<Arc<AtomicUsize>>| async move {
//!             if x == 7 {
//!                 return Err(WorkError::fail("seven is unlucky"));
//!             }
//!             Ok(x * 2)
//!         },
//!         |r: WorkResult<u64, u64>, _cfg: Arc<Arc<AtomicUsize>>| async move {
//!             match r.into_result() {
//!                 Ok((item, out)) => println!("{item} -> {out}"),
//!                 Err((item, msg)) => println!("{item} failed: {msg}"),
//!             }
//!             Ok::<_, HandleError>(())
//!         },
//!     );
//!
//!     let summary = exec.run(spec).await?;
//!     assert_eq!(summary.results_handled, 10);
//!     assert_eq!(summary.results_failed, 1);
//!     Ok(())
//! }
//! ```
mod cancel;
mod config;
mod core;
mod error;
mod events;
mod subscribers;
mod work;

// ---- Public re-exports ----

pub use cancel::{KillSwitch, RetirementChannel};
pub use config::ExecutorConfig;
pub use crate::core::{Executor, ExecutorBuilder, RunSummary, execute};
pub use error::{HandleError, RuntimeError, WorkError};
pub use events::{Bus, Event, EventKind, StopReason};
pub use subscribers::{Subscribe, SubscriberSet};
pub use work::{
    BoxHandleFuture, BoxWorkFuture, FinishHook, Handle, HandleFn, HandleRef, RunSpec, Sizer,
    SizerRef, StartHook, Work, WorkFn, WorkRef, WorkResult,
};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
