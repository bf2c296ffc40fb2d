//! # Run specification.
//!
//! Defines [`RunSpec`], the bundle handed to [`Executor::run`](crate::Executor::run):
//! input items, the caller's configuration value, the three callables and the
//! optional start/finish hooks.
//!
//! A spec can be created:
//! - **From closures** with [`RunSpec::new`] (argument types are inferred)
//! - **From trait objects** with [`RunSpec::from_parts`] (custom `Work`/`Handle`/`Sizer` types)
//!
//! ## Hooks
//! - `on_start` runs once, before the input queue is loaded and before any worker or
//!   the finisher exists. It receives the items and the configuration mutably and may
//!   edit or replace either. An error aborts the run before it starts.
//! - `on_finish` runs once, after every worker and the finisher stopped.

use std::future::Future;
use std::sync::Arc;

use crate::core::RunSummary;
use crate::error::{HandleError, WorkError};
use crate::work::{HandleFn, HandleRef, SizerRef, WorkFn, WorkRef, WorkResult};

/// Start hook: may edit/replace the items and the configuration.
pub type StartHook<I, C> = Box<dyn FnOnce(&mut Vec<I>, &mut C) -> anyhow::Result<()> + Send>;

/// Finish hook: observes the final configuration and the run summary.
pub type FinishHook<C> = Box<dyn FnOnce(&C, &RunSummary) + Send>;

/// Everything one run needs.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use dynexec::{RunSpec, WorkResult, WorkError, HandleError};
///
/// let spec = RunSpec::new(
///     1..=10u32,
///     (),
///     |_cfg: &()| 3,
///     |x: u32, _cfg: Arc<()>| async move { Ok::<_, WorkError>(x * 2) },
///     |r: WorkResult<u32, u32>, _cfg: Arc<()>| async move {
///         println!("{r:?}");
///         Ok::<_, HandleError>(())
///     },
/// )
/// .with_on_start(|items, _cfg| {
///     items.retain(|x| x % 2 == 0);
///     Ok(())
/// });
/// assert_eq!(spec.items().len(), 10);
/// ```
pub struct RunSpec<I, C, O> {
    pub(crate) items: Vec<I>,
    pub(crate) config: C,
    pub(crate) sizer: SizerRef<C>,
    pub(crate) work: WorkRef<I, C, O>,
    pub(crate) handler: HandleRef<I, O, C>,
    pub(crate) on_start: Option<StartHook<I, C>>,
    pub(crate) on_finish: Option<FinishHook<C>>,
}

impl<I, C, O> RunSpec<I, C, O>
where
    I: Send + 'static,
    C: Send + Sync + 'static,
    O: Send + 'static,
{
    /// Creates a spec from closures.
    ///
    /// ### Parameters
    /// - `items`: finite input sequence, iterated once here
    /// - `config`: value shared (read-only) with every callable
    /// - `sizer`: desired pool size
    /// - `work`: per-item work function
    /// - `handler`: single-consumer result handler
    pub fn new<S, W, WFut, H, HFut>(
        items: impl IntoIterator<Item = I>,
        config: C,
        sizer: S,
        work: W,
        handler: H,
    ) -> Self
    where
        S: Fn(&C) -> usize + Send + Sync + 'static,
        W: Fn(I, Arc<C>) -> WFut + Send + Sync + 'static,
        WFut: Future<Output = Result<O, WorkError>> + Send + 'static,
        H: FnMut(WorkResult<I, O>, Arc<C>) -> HFut + Send + 'static,
        HFut: Future<Output = Result<(), HandleError>> + Send + 'static,
    {
        Self::from_parts(
            items,
            config,
            Arc::new(sizer),
            WorkFn::arc(work),
            HandleFn::boxed(handler),
        )
    }

    /// Creates a spec from trait objects.
    pub fn from_parts(
        items: impl IntoIterator<Item = I>,
        config: C,
        sizer: SizerRef<C>,
        work: WorkRef<I, C, O>,
        handler: HandleRef<I, O, C>,
    ) -> Self {
        Self {
            items: items.into_iter().collect(),
            config,
            sizer,
            work,
            handler,
            on_start: None,
            on_finish: None,
        }
    }

    /// Returns a new spec with a start hook.
    pub fn with_on_start<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&mut Vec<I>, &mut C) -> anyhow::Result<()> + Send + 'static,
    {
        self.on_start = Some(Box::new(hook));
        self
    }

    /// Returns a new spec with a finish hook.
    pub fn with_on_finish<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&C, &RunSummary) + Send + 'static,
    {
        self.on_finish = Some(Box::new(hook));
        self
    }

    /// Returns the items as they will be loaded (before the start hook runs).
    pub fn items(&self) -> &[I] {
        &self.items
    }

    /// Returns the configuration value.
    pub fn config(&self) -> &C {
        &self.config
    }
}
