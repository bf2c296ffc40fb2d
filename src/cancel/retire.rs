//! # Retirement channel: targeted, one-shot worker stop.
//!
//! The controller is the only producer ([`issue`](RetirementChannel::issue)); workers
//! are the only consumers ([`try_take`](RetirementChannel::try_take)). A token is a
//! plain count: consuming one is an atomic decrement that can succeed at most once per
//! token, and a worker exits right after a successful take, so it never holds two.
//!
//! The controller waits for the count to reach zero with
//! [`drained`](RetirementChannel::drained), which is bounded by a timeout. Tokens still
//! pending after the timeout can be withdrawn with [`revoke`](RetirementChannel::revoke).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

/// Counting signal; one token retires one worker.
#[derive(Debug, Default)]
pub struct RetirementChannel {
    pending: AtomicUsize,
    drained: Notify,
}

impl RetirementChannel {
    /// Creates an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` tokens.
    pub fn issue(&self, n: usize) {
        if n > 0 {
            self.pending.fetch_add(n, Ordering::AcqRel);
        }
    }

    /// Non-blocking attempt to consume one token.
    pub fn try_take(&self) -> bool {
        let taken = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |p| p.checked_sub(1));
        match taken {
            Ok(1) => {
                self.drained.notify_waiters();
                true
            }
            Ok(_) => true,
            Err(_) => false,
        }
    }

    /// Withdraws every pending token; returns how many were withdrawn.
    pub fn revoke(&self) -> usize {
        let n = self.pending.swap(0, Ordering::AcqRel);
        if n > 0 {
            self.drained.notify_waiters();
        }
        n
    }

    /// Number of tokens not consumed yet.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Waits until all issued tokens are consumed, at most `timeout`.
    ///
    /// Returns `true` when drained, `false` on timeout.
    pub async fn drained(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.drained.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.pending() == 0 {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn each_token_is_consumed_once() {
        let ch = RetirementChannel::new();
        ch.issue(2);
        assert!(ch.try_take());
        assert!(ch.try_take());
        assert!(!ch.try_take());
        assert_eq!(ch.pending(), 0);
    }

    #[test]
    fn revoke_withdraws_pending_tokens() {
        let ch = RetirementChannel::new();
        ch.issue(3);
        assert!(ch.try_take());
        assert_eq!(ch.revoke(), 2);
        assert!(!ch.try_take());
        assert_eq!(ch.revoke(), 0);
    }

    #[tokio::test]
    async fn drained_returns_immediately_when_empty() {
        let ch = RetirementChannel::new();
        assert!(ch.drained(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn drained_waits_for_consumers() {
        let ch = Arc::new(RetirementChannel::new());
        ch.issue(2);

        let consumer = {
            let ch = ch.clone();
            tokio::spawn(async move {
                for _ in 0..2 {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    assert!(ch.try_take());
                }
            })
        };

        assert!(ch.drained(Duration::from_secs(2)).await);
        consumer.await.unwrap();
    }

    #[tokio::test]
    async fn drained_times_out_without_consumers() {
        let ch = RetirementChannel::new();
        ch.issue(1);
        assert!(!ch.drained(Duration::from_millis(30)).await);
        assert_eq!(ch.pending(), 1);
    }

    #[tokio::test]
    async fn concurrent_takers_never_over_consume() {
        let ch = Arc::new(RetirementChannel::new());
        ch.issue(5);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ch = ch.clone();
            handles.push(tokio::spawn(async move { ch.try_take() }));
        }
        let mut taken = 0;
        for h in handles {
            if h.await.unwrap() {
                taken += 1;
            }
        }
        assert_eq!(taken, 5);
    }
}
