use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dynexec::{Executor, ExecutorConfig, HandleError, RunSpec, WorkError, WorkResult};

fn fast_config() -> ExecutorConfig {
    ExecutorConfig {
        poll_period: Duration::from_millis(10),
        dequeue_timeout: Duration::from_millis(200),
        ..ExecutorConfig::default()
    }
}

/// Run configuration holding the desired pool width.
#[derive(Debug)]
struct Width(AtomicUsize);

impl Width {
    fn new(n: usize) -> Self {
        Self(AtomicUsize::new(n))
    }

    fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn set(&self, n: usize) {
        self.0.store(n, Ordering::SeqCst);
    }
}

/// Sleeps a little per item so resizes happen while input remains.
async fn slow_identity(x: u32, _cfg: Arc<Width>) -> Result<u32, WorkError> {
    tokio::time::sleep(Duration::from_millis(15)).await;
    Ok(x)
}

/// Handler changing the width to `to` once `after` results were handled.
fn resize_after(
    after: usize,
    to: usize,
) -> impl FnMut(WorkResult<u32, u32>, Arc<Width>) -> std::future::Ready<Result<(), HandleError>>
+ Send
+ 'static {
    let mut handled = 0usize;
    move |_r, cfg| {
        handled += 1;
        if handled == after {
            cfg.set(to);
        }
        std::future::ready(Ok(()))
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn shrinking_retires_exactly_the_difference() {
    let spec = RunSpec::new(
        1..=60u32,
        Width::new(4),
        |w: &Width| w.get(),
        slow_identity,
        resize_after(4, 1),
    );

    let summary = Executor::new(fast_config()).run(spec).await.unwrap();
    assert_eq!(summary.workers_started, 4);
    assert_eq!(summary.workers_retired, 3);
    assert_eq!(summary.workers_forced, 0);
    assert_eq!(summary.peak_workers, 4);
    assert_eq!(summary.results_handled, 60);
}

#[tokio::test(flavor = "multi_thread")]
async fn shrinking_faster_than_items_finish_never_over_retires() {
    let cfg = ExecutorConfig {
        poll_period: Duration::from_millis(5),
        ..fast_config()
    };
    let exec = Executor::new(cfg);

    for round in 0..8 {
        let spec = RunSpec::new(
            1..=40u32,
            Width::new(6),
            |w: &Width| w.get(),
            |x: u32, _cfg: Arc<Width>| async move {
                tokio::time::sleep(Duration::from_millis(25)).await;
                Ok::<_, WorkError>(x)
            },
            resize_after(6, 2),
        );

        let summary = exec.run(spec).await.unwrap();
        assert_eq!(summary.workers_started, 6, "round {round}: {summary}");
        assert_eq!(summary.workers_retired, 4, "round {round}: {summary}");
        assert_eq!(summary.workers_forced, 0, "round {round}: {summary}");
        assert_eq!(summary.results_failed, 0, "round {round}: {summary}");
        assert_eq!(summary.results_handled, 40);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn growing_spawns_exactly_the_difference() {
    let spec = RunSpec::new(
        1..=60u32,
        Width::new(1),
        |w: &Width| w.get(),
        slow_identity,
        resize_after(3, 4),
    );

    let summary = Executor::new(fast_config()).run(spec).await.unwrap();
    assert_eq!(summary.workers_started, 4);
    assert_eq!(summary.workers_retired, 0);
    assert_eq!(summary.peak_workers, 4);
    assert_eq!(summary.results_handled, 60);
}

#[tokio::test(flavor = "multi_thread")]
async fn max_workers_caps_the_target() {
    let cfg = ExecutorConfig {
        max_workers: 2,
        ..fast_config()
    };
    let spec = RunSpec::new(
        1..=20u32,
        Width::new(16),
        |w: &Width| w.get(),
        slow_identity,
        |_r: WorkResult<u32, u32>, _cfg: Arc<Width>| async { Ok::<_, HandleError>(()) },
    );

    let summary = Executor::new(cfg).run(spec).await.unwrap();
    assert_eq!(summary.workers_started, 2);
    assert_eq!(summary.peak_workers, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn stalled_retirement_force_retires_the_newest_worker() {
    let cfg = ExecutorConfig {
        retire_timeout: Duration::from_millis(20),
        ..fast_config()
    };
    let started = Instant::now();
    let spec = RunSpec::new(
        [1u32, 2, 3],
        (),
        // two workers at first, then one; both are busy when the shrink happens
        move |_: &()| {
            if started.elapsed() < Duration::from_millis(40) {
                2
            } else {
                1
            }
        },
        |x: u32, _cfg: Arc<()>| async move {
            tokio::time::sleep(Duration::from_millis(400)).await;
            Ok::<_, WorkError>(x)
        },
        {
            let results = Arc::new(std::sync::Mutex::new(Vec::new()));
            move |r: WorkResult<u32, u32>, _cfg: Arc<()>| {
                results.lock().unwrap().push(r.is_success());
                async { Ok::<_, HandleError>(()) }
            }
        },
    );

    let summary = Executor::new(cfg).run(spec).await.unwrap();
    assert_eq!(summary.workers_started, 2);
    assert_eq!(summary.workers_forced, 1);
    assert_eq!(summary.workers_retired, 0);
    assert_eq!(summary.results_handled, 3);
    assert_eq!(summary.results_failed, 1);
    assert!(!summary.was_killed());
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_target_with_input_left_waits_for_the_sizer() {
    let cfg = fast_config();
    let started = Instant::now();
    let spec = RunSpec::new(
        1..=5u32,
        (),
        move |_: &()| usize::from(started.elapsed() >= Duration::from_millis(80)),
        |x: u32, _cfg: Arc<()>| async move { Ok::<_, WorkError>(x) },
        |_r: WorkResult<u32, u32>, _cfg: Arc<()>| async { Ok::<_, HandleError>(()) },
    );

    let summary = Executor::new(cfg).run(spec).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(80));
    assert_eq!(summary.workers_started, 1);
    assert_eq!(summary.results_handled, 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_sizer_stops_the_run() {
    let spec = RunSpec::new(
        1..=5u32,
        (),
        |_: &()| -> usize { panic!("sizer bug") },
        |x: u32, _cfg: Arc<()>| async move { Ok::<_, WorkError>(x) },
        |_r: WorkResult<u32, u32>, _cfg: Arc<()>| async { Ok::<_, HandleError>(()) },
    );

    let summary = Executor::new(fast_config()).run(spec).await.unwrap();
    assert_eq!(summary.workers_started, 0);
    assert!(summary.killed.as_deref().unwrap().contains("sizer bug"));
}
