//! # Run queues.
//!
//! - [`InputQueue`]: MPMC FIFO of work items, bulk-loaded once and then sealed.
//! - [`Delivery`]: values carried by the output channel (worker → finisher).
//!
//! ## Rules
//! - No item is added after [`InputQueue::load`]; the queue is sealed by it.
//! - A sealed empty queue answers "no more work" immediately.
//! - An unsealed empty queue waits for items up to the caller's timeout.
//! - `Delivery::Done` is sent once, by the controller, after the last worker exited.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

use crate::work::WorkResult;

/// Value travelling on the output channel.
#[derive(Debug)]
pub(crate) enum Delivery<I, O> {
    /// One item's outcome.
    Result(WorkResult<I, O>),
    /// Terminal sentinel: no worker is alive any more.
    Done,
}

/// Shared input queue.
#[derive(Debug)]
pub(crate) struct InputQueue<I> {
    items: Mutex<VecDeque<I>>,
    sealed: AtomicBool,
    arrived: Notify,
}

impl<I> InputQueue<I> {
    pub(crate) fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            sealed: AtomicBool::new(false),
            arrived: Notify::new(),
        }
    }

    /// Appends all items and seals the queue.
    pub(crate) fn load(&self, items: impl IntoIterator<Item = I>) {
        self.lock().extend(items);
        self.sealed.store(true, Ordering::Release);
        self.arrived.notify_waiters();
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub(crate) fn try_pop(&self) -> Option<I> {
        self.lock().pop_front()
    }

    /// Takes the next item, waiting at most `timeout` while the queue is not sealed.
    pub(crate) async fn pop(&self, timeout: Duration) -> Option<I> {
        let wait = async {
            loop {
                let arrived = self.arrived.notified();
                tokio::pin!(arrived);
                arrived.as_mut().enable();

                if let Some(item) = self.try_pop() {
                    return Some(item);
                }
                if self.sealed.load(Ordering::Acquire) {
                    return None;
                }
                arrived.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.ok().flatten()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<I>> {
        // Critical sections never panic; a poisoned lock still holds a valid deque.
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn sealed_empty_queue_returns_immediately() {
        let q = InputQueue::<u32>::new();
        q.load(Vec::new());

        let started = tokio::time::Instant::now();
        assert_eq!(q.pop(Duration::from_secs(30)).await, None);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn fifo_order() {
        let q = InputQueue::new();
        q.load([1, 2, 3]);
        assert_eq!(q.len(), 3);
        assert_eq!(q.pop(Duration::from_millis(10)).await, Some(1));
        assert_eq!(q.pop(Duration::from_millis(10)).await, Some(2));
        assert_eq!(q.pop(Duration::from_millis(10)).await, Some(3));
        assert!(q.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unsealed_queue_times_out() {
        let q = InputQueue::<u32>::new();
        assert_eq!(q.pop(Duration::from_millis(50)).await, None);
    }

    #[tokio::test]
    async fn waiter_wakes_on_load() {
        let q = Arc::new(InputQueue::new());
        let waiter = {
            let q = Arc::clone(&q);
            tokio::spawn(async move { q.pop(Duration::from_secs(5)).await })
        };
        tokio::task::yield_now().await;
        q.load(["a"]);
        assert_eq!(waiter.await.unwrap(), Some("a"));
    }
}
