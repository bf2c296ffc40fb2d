//! # OS signal watcher.
//!
//! When [`ExecutorConfig::handle_signals`](crate::ExecutorConfig::handle_signals) is
//! enabled the executor spawns [`watch_signals`] next to the run. The first
//! termination signal trips the kill switch with reason `"signal"`; the watcher
//! also returns as soon as the kill switch is set for any other reason.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT`
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use crate::cancel::KillSwitch;
use crate::core::trip_kill_switch;
use crate::events::Bus;

/// Kill reason used for OS signals.
pub(crate) const SIGNAL_REASON: &str = "signal";

/// Trips `kill` on the first termination signal.
///
/// If the listeners cannot be registered the watcher just waits for the kill
/// switch; the run is not affected.
pub(crate) async fn watch_signals(kill: KillSwitch, bus: Bus) {
    tokio::select! {
        res = wait_for_shutdown_signal() => {
            if res.is_ok() {
                trip_kill_switch(&kill, &bus, SIGNAL_REASON.to_string());
            } else {
                kill.triggered().await;
            }
        }
        _ = kill.triggered() => {}
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
