//! # Run-wide kill switch.
//!
//! [`KillSwitch`] wraps a [`CancellationToken`] and remembers the reason of the
//! first trigger. It has exactly one legal transition (unset → set) and no way
//! back; every clone observes the same state.
//!
//! ## Rules
//! - The first [`trigger`](KillSwitch::trigger) wins: its reason is kept, it returns `true`.
//! - Later triggers are no-ops returning `false`.
//! - The reason is recorded **before** the token is cancelled, so any observer
//!   that sees `is_set() == true` also sees the reason.

use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

/// One-way, broadcast stop flag.
#[derive(Clone, Debug, Default)]
pub struct KillSwitch {
    token: CancellationToken,
    reason: Arc<OnceLock<String>>,
}

impl KillSwitch {
    /// Creates an unset switch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the switch. Returns `true` only for the call that actually flipped it.
    pub fn trigger(&self, reason: impl Into<String>) -> bool {
        let first = self.reason.set(reason.into()).is_ok();
        self.token.cancel();
        first
    }

    /// Returns `true` once the switch has been set.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns the reason given by the first trigger.
    pub fn reason(&self) -> Option<&str> {
        if self.is_set() {
            self.reason.get().map(String::as_str)
        } else {
            None
        }
    }

    /// Completes when the switch is set (immediately if it already is).
    pub async fn triggered(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn first_trigger_wins() {
        let kill = KillSwitch::new();
        assert!(!kill.is_set());
        assert_eq!(kill.reason(), None);

        assert!(kill.trigger("item 2"));
        assert!(!kill.trigger("item 4"));

        assert!(kill.is_set());
        assert_eq!(kill.reason(), Some("item 2"));
    }

    #[test]
    fn clones_share_state() {
        let kill = KillSwitch::new();
        let other = kill.clone();
        other.trigger("from clone");
        assert!(kill.is_set());
        assert_eq!(kill.reason(), Some("from clone"));
    }

    #[tokio::test]
    async fn triggered_wakes_waiters() {
        let kill = KillSwitch::new();
        let waiter = {
            let kill = kill.clone();
            tokio::spawn(async move { kill.triggered().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        kill.trigger("stop");
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter not woken")
            .unwrap();
    }
}
