//! # Executor: runs a [`RunSpec`] to completion.
//!
//! The [`Executor`] owns the runtime configuration and the event subscribers. Every
//! call to [`Executor::run`] builds a fresh set of run-scoped parts (queues, kill
//! switch, retirement channel, event bus, finisher) and drives them until the run
//! completes.
//!
//! ## High-level architecture
//! ```text
//! run(spec):
//!   validate ExecutorConfig             ── error → RuntimeError::Config
//!   on_start(&mut items, &mut config)   ── error → RuntimeError::StartHook
//!   InputQueue.load(items) + seal
//!   spawn run listener:   Bus ──► SubscriberSet::emit(Event)
//!   spawn Finisher:       OutputChannel ──► handler(result, config)
//!   (optional) spawn signal watcher ──► KillSwitch
//!
//!   Controller::drive()   (caller's task)
//!        │  sizer(&config) → spawn / retire workers
//!        ▼
//!   Worker 1..N ── WorkResult ──► OutputChannel ──► Finisher
//!
//!   no live worker → send Done → join Finisher
//!   on_finish(&config, &summary)
//!   publish RunFinished, flush subscribers
//!   return Ok(RunSummary) | Err(HandlerFailed/HandlerPanicked)
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use dynexec::{Executor, ExecutorConfig, HandleError, RunSpec, WorkError, WorkResult};
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = ExecutorConfig::default();
//!     cfg.poll_period = Duration::from_millis(20);
//!     let exec = Executor::builder(cfg).build();
//!
//!     let spec = RunSpec::new(
//!         1..=10u64,
//!         3usize,
//!         |width: &usize| *width,
//!         |x: u64, _cfg: Arc<usize>| async move { Ok::<_, WorkError>(x * 2) },
//!         |r: WorkResult<u64, u64>, _cfg: Arc<usize>| async move {
//!             assert!(r.is_success());
//!             Ok::<_, HandleError>(())
//!         },
//!     );
//!
//!     let summary = exec.run(spec).await?;
//!     assert_eq!(summary.results_handled, 10);
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cancel::{KillSwitch, RetirementChannel};
use crate::config::ExecutorConfig;
use crate::core::builder::ExecutorBuilder;
use crate::core::controller::Controller;
use crate::core::finisher::Finisher;
use crate::core::queue::{Delivery, InputQueue};
use crate::core::shutdown;
use crate::core::summary::{RunSummary, Stats};
use crate::core::worker::WorkerCtx;
use crate::error::{HandleError, RuntimeError, WorkError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::work::{RunSpec, WorkResult};

/// Runs dynamic worker pools.
///
/// An executor is reusable: each [`run`](Executor::run) is independent and
/// shares nothing with previous runs except the configuration and subscribers.
#[derive(Clone)]
pub struct Executor {
    cfg: ExecutorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

/// Bus → subscriber set forwarding task of one run.
struct RunListener {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl RunListener {
    /// Forwards what is still buffered, then waits until every subscriber saw it.
    async fn flush(self) {
        self.stop.cancel();
        let _ = self.handle.await;
    }
}

impl Executor {
    /// Creates an executor without subscribers.
    pub fn new(cfg: ExecutorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Returns a builder for an executor with subscribers.
    pub fn builder(cfg: ExecutorConfig) -> ExecutorBuilder {
        ExecutorBuilder::new(cfg)
    }

    pub(crate) fn from_parts(cfg: ExecutorConfig, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { cfg, subscribers }
    }

    /// Returns the runtime configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.cfg
    }

    /// Runs `spec` until the input is exhausted (or the kill switch fires) and no
    /// worker is left.
    ///
    /// ### Errors
    /// - [`RuntimeError::Config`]: invalid [`ExecutorConfig`], nothing was started
    /// - [`RuntimeError::StartHook`]: the start hook failed, nothing was started
    /// - [`RuntimeError::HandlerFailed`] / [`RuntimeError::HandlerPanicked`]: the
    ///   handler was defective; the run was stopped and the finish hook still ran
    /// - [`RuntimeError::FinisherLost`]: the finisher task could not be joined
    ///
    /// Aborts (from the work function or the handler) are not errors: the run ends
    /// early and [`RunSummary::killed`] carries the reason.
    pub async fn run<I, C, O>(&self, spec: RunSpec<I, C, O>) -> Result<RunSummary, RuntimeError>
    where
        I: Clone + Send + 'static,
        C: Send + Sync + 'static,
        O: Send + 'static,
    {
        self.cfg.validate()?;

        let RunSpec {
            mut items,
            mut config,
            sizer,
            work,
            handler,
            on_start,
            on_finish,
        } = spec;
        if let Some(hook) = on_start {
            hook(&mut items, &mut config).map_err(|e| RuntimeError::StartHook {
                error: format!("{e:#}"),
            })?;
        }

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listener = self.subscriber_listener(&bus);
        let config = Arc::new(config);
        let kill = KillSwitch::new();
        let stats = Arc::new(Stats::default());

        let input = Arc::new(InputQueue::new());
        input.load(items);
        let items_loaded = input.len();
        bus.publish(Event::new(EventKind::RunStarting).with_count(items_loaded));

        let (tx, rx) = mpsc::unbounded_channel();
        let finisher = tokio::spawn(
            Finisher::new(rx, handler, Arc::clone(&config), kill.clone(), bus.clone()).run(),
        );
        let signals = self
            .cfg
            .handle_signals
            .then(|| tokio::spawn(shutdown::watch_signals(kill.clone(), bus.clone())));

        let ctx = WorkerCtx {
            input,
            output: tx.clone(),
            retire: Arc::new(RetirementChannel::new()),
            kill: kill.clone(),
            work,
            config: Arc::clone(&config),
            bus: bus.clone(),
            stats: Arc::clone(&stats),
            dequeue_timeout: self.cfg.dequeue_timeout,
        };
        let mut controller = Controller::new(self.cfg.clone(), sizer, ctx);
        controller.drive().await;
        drop(controller);

        // every worker exited: Done is the last delivery
        let _ = tx.send(Delivery::Done);
        drop(tx);
        let (handled, failure) = match finisher.await {
            Ok(report) => (report.handled, report.error),
            Err(e) => (
                0,
                Some(RuntimeError::FinisherLost {
                    error: e.to_string(),
                }),
            ),
        };
        if let Some(watcher) = signals {
            watcher.abort();
            let _ = watcher.await;
        }

        let summary = stats.snapshot(items_loaded, handled, kill.reason().map(str::to_owned));
        if let Some(hook) = on_finish {
            hook(config.as_ref(), &summary);
        }

        let mut finished = Event::new(EventKind::RunFinished).with_count(handled);
        if let Some(reason) = &summary.killed {
            finished = finished.with_reason(reason.as_str());
        }
        bus.publish(finished);
        if let Some(listener) = listener {
            listener.flush().await;
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }

    /// Blocking variant of [`run`](Executor::run) that owns a multi-thread runtime.
    ///
    /// Must not be called from inside a tokio runtime.
    pub fn run_blocking<I, C, O>(&self, spec: RunSpec<I, C, O>) -> Result<RunSummary, RuntimeError>
    where
        I: Clone + Send + 'static,
        C: Send + Sync + 'static,
        O: Send + 'static,
    {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| RuntimeError::Runtime {
                error: e.to_string(),
            })?;
        rt.block_on(self.run(spec))
    }

    /// Spawns the listener that forwards bus events to the subscriber set.
    ///
    /// Returns `None` when there is nobody to forward to.
    fn subscriber_listener(&self, bus: &Bus) -> Option<RunListener> {
        if self.subscribers.is_empty() {
            return None;
        }
        let set = SubscriberSet::new(self.subscribers.clone(), bus.clone());
        let mut rx = bus.subscribe();
        let stop = CancellationToken::new();

        let handle = tokio::spawn({
            let stop = stop.clone();
            async move {
                loop {
                    tokio::select! {
                        biased;
                        ev = rx.recv() => match ev {
                            Ok(ev) => set.emit(ev),
                            Err(broadcast::error::RecvError::Lagged(_)) => continue,
                            Err(broadcast::error::RecvError::Closed) => break,
                        },
                        _ = stop.cancelled() => {
                            loop {
                                match rx.try_recv() {
                                    Ok(ev) => set.emit(ev),
                                    Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                                    Err(_) => break,
                                }
                            }
                            break;
                        }
                    }
                }
                set.shutdown().await;
            }
        });
        Some(RunListener { stop, handle })
    }
}

/// Runs one pool with default settings and the given poll period.
///
/// Shorthand for [`Executor::run`] with a [`RunSpec::new`] spec and no subscribers.
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use dynexec::{HandleError, WorkError, WorkResult, execute};
///
/// # #[tokio::main(flavor = "multi_thread")]
/// # async fn main() {
/// let summary = execute(
///     vec!["a", "bb", "ccc"],
///     (),
///     |_: &()| 2,
///     Duration::from_millis(10),
///     |s: &'static str, _cfg: Arc<()>| async move { Ok::<_, WorkError>(s.len()) },
///     |_r: WorkResult<&'static str, usize>, _cfg: Arc<()>| async { Ok::<_, HandleError>(()) },
/// )
/// .await
/// .unwrap();
/// assert_eq!(summary.results_handled, 3);
/// # }
/// ```
pub async fn execute<I, C, O, S, W, WFut, H, HFut>(
    items: impl IntoIterator<Item = I>,
    config: C,
    sizer: S,
    poll_period: Duration,
    work: W,
    handler: H,
) -> Result<RunSummary, RuntimeError>
where
    I: Clone + Send + 'static,
    C: Send + Sync + 'static,
    O: Send + 'static,
    S: Fn(&C) -> usize + Send + Sync + 'static,
    W: Fn(I, Arc<C>) -> WFut + Send + Sync + 'static,
    WFut: Future<Output = Result<O, WorkError>> + Send + 'static,
    H: FnMut(WorkResult<I, O>, Arc<C>) -> HFut + Send + 'static,
    HFut: Future<Output = Result<(), HandleError>> + Send + 'static,
{
    let cfg = ExecutorConfig {
        poll_period,
        ..ExecutorConfig::default()
    };
    Executor::new(cfg)
        .run(RunSpec::new(items, config, sizer, work, handler))
        .await
}
