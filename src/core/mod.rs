//! # Execution engine.
//!
//! This module wires the run-scoped parts together:
//! - [`Executor`] - entry point; validates, runs hooks, owns the run lifecycle
//! - `controller` - sizing loop running in the caller's task
//! - `worker` - one pool slot; dequeues, runs the work function, emits results
//! - `finisher` - single consumer passing results to the handler
//! - `roster` - controller-private set of live workers
//! - `queue` - sealed input queue and the output delivery type
//! - `shutdown` - optional OS signal watcher
//! - [`RunSummary`] - counters of a finished run

mod builder;
mod controller;
mod executor;
mod finisher;
mod queue;
mod roster;
mod shutdown;
mod summary;
mod worker;

pub use builder::ExecutorBuilder;
pub use executor::{Executor, execute};
pub use summary::RunSummary;

use std::any::Any;

use crate::cancel::KillSwitch;
use crate::events::{Bus, Event, EventKind};

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Trips the kill switch and publishes `KillSwitchTriggered` for the first trigger only.
pub(crate) fn trip_kill_switch(kill: &KillSwitch, bus: &Bus, reason: String) {
    if kill.trigger(reason.as_str()) {
        bus.publish(Event::new(EventKind::KillSwitchTriggered).with_reason(reason));
    }
}
