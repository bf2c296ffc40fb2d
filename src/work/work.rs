//! # Work function abstraction and function-backed implementation.
//!
//! [`Work`] is called once per item, concurrently from every live worker, so it is
//! `Sync` and takes `&self`. Each call produces a fresh boxed future that owns
//! its state; share mutable state explicitly through `Arc<...>` if needed.
//!
//! ## Result mapping
//! - `Ok(output)` → `WorkResult::Success`
//! - `Err(WorkError::Fail { .. })` → `WorkResult::Failure`
//! - `Err(WorkError::Abort { .. })` → kill switch, no result for this item
//! - panic inside the future → `WorkResult::Failure` carrying the panic message
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use dynexec::{WorkFn, WorkRef, WorkError};
//!
//! let double: WorkRef<u32, (), u32> = WorkFn::arc(|x: u32, _cfg: Arc<()>| async move {
//!     Ok::<_, WorkError>(x * 2)
//! });
//! # let _ = double;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::WorkError;

/// Boxed future returned by [`Work::call`].
pub type BoxWorkFuture<O> = Pin<Box<dyn Future<Output = Result<O, WorkError>> + Send + 'static>>;

/// Shared handle to a work function.
pub type WorkRef<I, C, O> = Arc<dyn Work<I, C, Output = O>>;

/// Per-item work function.
pub trait Work<I, C>: Send + Sync + 'static {
    /// Value produced for a successful item.
    type Output: Send + 'static;

    /// Starts processing `item`.
    fn call(&self, item: I, config: Arc<C>) -> BoxWorkFuture<Self::Output>;
}

/// Function-backed work.
///
/// Wraps a closure that *creates* a new future per item.
#[derive(Debug)]
pub struct WorkFn<F> {
    f: F,
}

impl<F> WorkFn<F> {
    /// Creates a new function-backed work function.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the work function and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<I, C, O, F, Fut> Work<I, C> for WorkFn<F>
where
    F: Fn(I, Arc<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, WorkError>> + Send + 'static,
    O: Send + 'static,
{
    type Output = O;

    fn call(&self, item: I, config: Arc<C>) -> BoxWorkFuture<O> {
        Box::pin((self.f)(item, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn each_call_gets_its_own_future() {
        let work: WorkRef<u32, u32, u32> = WorkFn::arc(|x: u32, cfg: Arc<u32>| async move {
            if x == 0 {
                return Err(WorkError::fail("zero"));
            }
            Ok(x * *cfg)
        });
        let cfg = Arc::new(10);

        let a = work.call(1, cfg.clone());
        let b = work.call(0, cfg.clone());
        let c = work.call(3, cfg);

        assert_eq!(c.await, Ok(30));
        assert_eq!(a.await, Ok(10));
        assert_eq!(b.await, Err(WorkError::fail("zero")));
    }
}
