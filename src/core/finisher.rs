//! # Finisher: the single consumer of results.
//!
//! Exactly one [`Finisher`] runs per run. It receives [`Delivery`] values in the
//! order workers sent them and passes each result to the handler, so the handler
//! never runs concurrently with itself and sees results in completion order.
//!
//! ## Stop conditions
//! - `Delivery::Done` received (normal completion)
//! - kill switch set (checked before every receive and raced against it)
//! - handler returned [`HandleError::Abort`] (trips the kill switch)
//! - handler defect: [`HandleError::Fail`] or a panic (trips the kill switch and
//!   becomes the run's [`RuntimeError`])

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;

use crate::cancel::KillSwitch;
use crate::core::queue::Delivery;
use crate::core::{panic_message, trip_kill_switch};
use crate::error::{HandleError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::work::HandleRef;

/// What the finisher reports back to the controller.
pub(crate) struct FinisherReport {
    /// Handler invocations.
    pub(crate) handled: usize,
    /// Set when the handler was defective.
    pub(crate) error: Option<RuntimeError>,
}

pub(crate) struct Finisher<I, O, C> {
    rx: mpsc::UnboundedReceiver<Delivery<I, O>>,
    handler: HandleRef<I, O, C>,
    config: Arc<C>,
    kill: KillSwitch,
    bus: Bus,
}

impl<I, O, C> Finisher<I, O, C>
where
    I: Send + 'static,
    O: Send + 'static,
    C: Send + Sync + 'static,
{
    pub(crate) fn new(
        rx: mpsc::UnboundedReceiver<Delivery<I, O>>,
        handler: HandleRef<I, O, C>,
        config: Arc<C>,
        kill: KillSwitch,
        bus: Bus,
    ) -> Self {
        Self {
            rx,
            handler,
            config,
            kill,
            bus,
        }
    }

    pub(crate) async fn run(mut self) -> FinisherReport {
        let mut handled = 0usize;

        let (why, error) = loop {
            if self.kill.is_set() {
                break ("killed".to_string(), None);
            }
            let delivery = tokio::select! {
                biased;
                _ = self.kill.triggered() => break ("killed".to_string(), None),
                d = self.rx.recv() => d,
            };
            let result = match delivery {
                Some(Delivery::Result(result)) => result,
                Some(Delivery::Done) | None => break ("done".to_string(), None),
            };

            handled += 1;
            let attempt = {
                let handler = &mut self.handler;
                let config = Arc::clone(&self.config);
                AssertUnwindSafe(async move { handler.call(result, config).await }).catch_unwind()
            };
            match attempt.await {
                Ok(Ok(())) => {}
                Ok(Err(HandleError::Abort { reason })) => {
                    trip_kill_switch(&self.kill, &self.bus, format!("handler aborted: {reason}"));
                    break (format!("aborted: {reason}"), None);
                }
                Ok(Err(HandleError::Fail { error })) => {
                    let err = RuntimeError::HandlerFailed { error };
                    trip_kill_switch(&self.kill, &self.bus, err.to_string());
                    break (err.as_message(), Some(err));
                }
                Err(panic_err) => {
                    let err = RuntimeError::HandlerPanicked {
                        info: panic_message(&*panic_err),
                    };
                    trip_kill_switch(&self.kill, &self.bus, err.to_string());
                    break (err.as_message(), Some(err));
                }
            }
        };

        self.bus.publish(
            Event::new(EventKind::FinisherStopped)
                .with_count(handled)
                .with_reason(why),
        );
        FinisherReport { handled, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::{HandleFn, WorkResult};
    use std::sync::Mutex;

    type Seen = Arc<Mutex<Vec<u32>>>;

    fn recording(seen: Seen, fail_on: Option<u32>) -> HandleRef<u32, u32, ()> {
        HandleFn::boxed(move |r: WorkResult<u32, u32>, _cfg: Arc<()>| {
            let item = *r.item();
            seen.lock().unwrap().push(item);
            async move {
                match fail_on {
                    Some(x) if x == item => Err(HandleError::abort("enough")),
                    _ => Ok(()),
                }
            }
        })
    }

    #[tokio::test]
    async fn handles_in_delivery_order_until_done() {
        let (tx, rx) = mpsc::unbounded_channel();
        let seen: Seen = Arc::default();
        let fin = Finisher::new(
            rx,
            recording(seen.clone(), None),
            Arc::new(()),
            KillSwitch::new(),
            Bus::new(8),
        );

        for x in [3, 1, 2] {
            tx.send(Delivery::Result(WorkResult::success(x, x))).unwrap();
        }
        tx.send(Delivery::Done).unwrap();

        let report = fin.run().await;
        assert_eq!(report.handled, 3);
        assert!(report.error.is_none());
        assert_eq!(*seen.lock().unwrap(), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn handler_abort_stops_and_trips_kill() {
        let (tx, rx) = mpsc::unbounded_channel();
        let seen: Seen = Arc::default();
        let kill = KillSwitch::new();
        let fin = Finisher::new(
            rx,
            recording(seen.clone(), Some(2)),
            Arc::new(()),
            kill.clone(),
            Bus::new(8),
        );

        for x in [1, 2, 3] {
            tx.send(Delivery::Result(WorkResult::success(x, x))).unwrap();
        }

        let report = fin.run().await;
        assert_eq!(report.handled, 2);
        assert!(kill.is_set());
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn kill_unblocks_an_idle_finisher() {
        let (_tx, rx) = mpsc::unbounded_channel::<Delivery<u32, u32>>();
        let kill = KillSwitch::new();
        let fin = Finisher::new(
            rx,
            recording(Arc::default(), None),
            Arc::new(()),
            kill.clone(),
            Bus::new(8),
        );

        let handle = tokio::spawn(fin.run());
        tokio::task::yield_now().await;
        kill.trigger("test");

        let report = handle.await.unwrap();
        assert_eq!(report.handled, 0);
    }

    #[tokio::test]
    async fn handler_failure_is_a_runtime_error() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler: HandleRef<u32, u32, ()> =
            HandleFn::boxed(|_r: WorkResult<u32, u32>, _cfg: Arc<()>| async {
                Err::<(), _>(HandleError::fail("disk full"))
            });
        let kill = KillSwitch::new();
        let fin = Finisher::new(rx, handler, Arc::new(()), kill.clone(), Bus::new(8));
        tx.send(Delivery::Result(WorkResult::success(1, 1))).unwrap();

        let report = fin.run().await;
        assert!(matches!(report.error, Some(RuntimeError::HandlerFailed { .. })));
        assert!(kill.is_set());
    }
}
