//! # Result handler abstraction.
//!
//! [`Handle`] runs on the single finisher task, one result at a time, in the order
//! results were queued. It takes `&mut self`, so a handler may keep plain mutable
//! state (counters, buffers) without locking.
//!
//! ## Error mapping
//! - `Err(HandleError::Abort { .. })` → kill switch, finisher stops
//! - `Err(HandleError::Fail { .. })` or a panic → handler defect: the run is stopped
//!   and `run` returns the error

use std::future::Future;
use std::pin::Pin;

use crate::error::HandleError;
use crate::work::WorkResult;

/// Boxed future returned by [`Handle::call`].
pub type BoxHandleFuture = Pin<Box<dyn Future<Output = Result<(), HandleError>> + Send + 'static>>;

/// Owned handle to a result handler.
pub type HandleRef<I, O, C> = Box<dyn Handle<I, O, C>>;

/// Single-consumer result handler.
pub trait Handle<I, O, C>: Send + 'static {
    /// Handles one result.
    fn call(&mut self, result: WorkResult<I, O>, config: std::sync::Arc<C>) -> BoxHandleFuture;
}

/// Function-backed handler (`FnMut`).
///
/// The closure may mutate captured state synchronously before returning its future.
#[derive(Debug)]
pub struct HandleFn<F> {
    f: F,
}

impl<F> HandleFn<F> {
    /// Creates a new function-backed handler.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it boxed.
    pub fn boxed(f: F) -> Box<Self> {
        Box::new(Self::new(f))
    }
}

impl<I, O, C, F, Fut> Handle<I, O, C> for HandleFn<F>
where
    F: FnMut(WorkResult<I, O>, std::sync::Arc<C>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), HandleError>> + Send + 'static,
{
    fn call(&mut self, result: WorkResult<I, O>, config: std::sync::Arc<C>) -> BoxHandleFuture {
        Box::pin((self.f)(result, config))
    }
}
