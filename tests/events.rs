use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use dynexec::{
    Event, EventKind, Executor, ExecutorConfig, HandleError, RunSpec, StopReason, Subscribe,
    WorkError, WorkResult,
};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    fn count(&self, kind: EventKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

struct Slow;

#[async_trait]
impl Subscribe for Slow {
    async fn on_event(&self, _event: &Event) {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn name(&self) -> &'static str {
        "slow"
    }

    fn queue_capacity(&self) -> usize {
        1
    }
}

fn fast_config() -> ExecutorConfig {
    ExecutorConfig {
        poll_period: Duration::from_millis(10),
        dequeue_timeout: Duration::from_millis(200),
        ..ExecutorConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn subscribers_see_the_whole_run_before_it_returns() {
    let recorder = Arc::new(Recorder::default());
    let exec = Executor::builder(fast_config())
        .with_subscriber(recorder.clone())
        .build();

    let spec = RunSpec::new(
        1..=6u32,
        (),
        |_: &()| 2,
        |x: u32, _cfg: Arc<()>| async move {
            if x == 4 {
                Err(WorkError::fail("four"))
            } else {
                Ok(x)
            }
        },
        |_r: WorkResult<u32, u32>, _cfg: Arc<()>| async { Ok::<_, HandleError>(()) },
    );
    exec.run(spec).await.unwrap();

    let kinds = recorder.kinds();
    assert_eq!(kinds.first(), Some(&EventKind::RunStarting));
    assert_eq!(kinds.last(), Some(&EventKind::RunFinished));
    assert_eq!(recorder.count(EventKind::WorkerStarted), 2);
    assert_eq!(recorder.count(EventKind::WorkerStopped), 2);
    assert_eq!(recorder.count(EventKind::ItemFailed), 1);
    assert_eq!(recorder.count(EventKind::FinisherStopped), 1);
    assert_eq!(recorder.count(EventKind::KillSwitchTriggered), 0);

    let events = recorder.events.lock().unwrap();
    assert!(
        events
            .iter()
            .filter(|e| e.kind == EventKind::WorkerStopped)
            .all(|e| e.stop == Some(StopReason::Drained))
    );
    let mut seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
    seqs.sort_unstable();
    seqs.dedup();
    assert_eq!(seqs.len(), events.len());
}

#[tokio::test(flavor = "multi_thread")]
async fn abort_is_visible_as_events() {
    let recorder = Arc::new(Recorder::default());
    let exec = Executor::builder(fast_config())
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
        .build();

    let spec = RunSpec::new(
        1..=3u32,
        (),
        |_: &()| 1,
        |x: u32, _cfg: Arc<()>| async move {
            if x == 2 {
                Err(WorkError::abort("bad batch"))
            } else {
                Ok(x)
            }
        },
        |_r: WorkResult<u32, u32>, _cfg: Arc<()>| async { Ok::<_, HandleError>(()) },
    );
    exec.run(spec).await.unwrap();

    let events = recorder.events.lock().unwrap();
    let aborted = events
        .iter()
        .find(|e| e.kind == EventKind::ItemAborted)
        .unwrap();
    assert_eq!(aborted.reason.as_deref(), Some("bad batch"));
    assert_eq!(
        events
            .iter()
            .filter(|e| e.kind == EventKind::KillSwitchTriggered)
            .count(),
        1
    );
    let finished = events.last().unwrap();
    assert_eq!(finished.kind, EventKind::RunFinished);
    assert!(finished.reason.as_deref().unwrap().contains("bad batch"));
}

#[tokio::test(flavor = "multi_thread")]
async fn a_slow_subscriber_never_blocks_the_run() {
    let recorder = Arc::new(Recorder::default());
    let exec = Executor::builder(fast_config())
        .with_subscriber(Arc::new(Slow))
        .with_subscriber(recorder.clone())
        .build();

    let spec = RunSpec::new(
        1..=50u32,
        (),
        |_: &()| 8,
        |x: u32, _cfg: Arc<()>| async move { Ok::<_, WorkError>(x) },
        |_r: WorkResult<u32, u32>, _cfg: Arc<()>| async { Ok::<_, HandleError>(()) },
    );
    let summary = tokio::time::timeout(Duration::from_secs(10), exec.run(spec))
        .await
        .expect("slow subscriber must not stall the run")
        .unwrap();

    assert_eq!(summary.results_handled, 50);
    // overflow reports about the slow subscriber may trail the final event
    assert_eq!(recorder.count(EventKind::RunFinished), 1);
    assert_eq!(recorder.count(EventKind::WorkerStarted), 8);
}

#[cfg(feature = "logging")]
#[tokio::test(flavor = "multi_thread")]
async fn log_writer_can_be_installed() {
    let exec = Executor::builder(fast_config())
        .with_subscriber(Arc::new(dynexec::LogWriter::new()))
        .build();
    let spec = RunSpec::new(
        1..=3u32,
        (),
        |_: &()| 1,
        |x: u32, _cfg: Arc<()>| async move { Ok::<_, WorkError>(x) },
        |_r: WorkResult<u32, u32>, _cfg: Arc<()>| async { Ok::<_, HandleError>(()) },
    );
    assert_eq!(exec.run(spec).await.unwrap().results_handled, 3);
}
