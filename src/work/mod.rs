//! # Work abstractions and run specification.
//!
//! This module provides the types a caller hands to the executor:
//! - [`Work`] / [`WorkFn`] - the per-item work function (parallel, shared)
//! - [`Handle`] / [`HandleFn`] - the result handler (single consumer, exclusive)
//! - [`Sizer`] - the sizing function producing the desired pool size
//! - [`WorkResult`] - tagged outcome of one item
//! - [`RunSpec`] - bundle of items, configuration, callables and hooks
//!
//! Every callable receives the run configuration as a shared `Arc<C>`; the item slot
//! is always the first argument and never part of `C`.

mod handle;
mod result;
mod sizer;
mod spec;
mod work;

pub use handle::{BoxHandleFuture, Handle, HandleFn, HandleRef};
pub use result::WorkResult;
pub use sizer::{Sizer, SizerRef};
pub use spec::{FinishHook, RunSpec, StartHook};
pub use work::{BoxWorkFuture, Work, WorkFn, WorkRef};
