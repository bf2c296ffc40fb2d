//! Cancellation primitives shared by the controller, workers and finisher.
//!
//! Two tiers:
//! - [`KillSwitch`]: run-wide, one-way, broadcast stop (unset → set, never cleared).
//! - [`RetirementChannel`]: targeted stop; each token retires exactly one worker.
//!
//! ```text
//! Controller ──issue(n)──► RetirementChannel ──try_take()──► Worker (exits)
//!      │                                                      ▲
//!      └──────────── drained(timeout) / revoke() ─────────────┘
//!
//! Worker / Finisher ──trigger(reason)──► KillSwitch ──is_set() / triggered()──► everyone
//! ```

mod kill;
mod retire;

pub use kill::KillSwitch;
pub use retire::RetirementChannel;
