//! # Example: Dynamic Pool
//!
//! Processes 40 "downloads" with a pool whose width follows a shared knob:
//! - starts with 2 workers
//! - a background task widens the pool to 6, then narrows it to 1
//! - item 13 fails, every result is printed by the single handler
//!
//! Runtime events are written through `tracing` by the built-in `LogWriter`.
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example dynamic_pool
//! ```

use std::{
    sync::Arc,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use dynexec::{
    Executor, ExecutorConfig, HandleError, LogWriter, RunSpec, Subscribe, WorkError, WorkResult,
};
use rand::Rng;
use tracing_subscriber::EnvFilter;

/// Run configuration shared with every callable.
struct Knob {
    width: AtomicUsize,
    base_ms: u64,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut cfg = ExecutorConfig::default();
    cfg.poll_period = Duration::from_millis(100);
    cfg.retire_timeout = Duration::from_secs(2);
    cfg.handle_signals = true;

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let exec = Executor::builder(cfg).with_subscribers(subs).build();

    let knob = Arc::new(Knob {
        width: AtomicUsize::new(2),
        base_ms: 80,
    });

    // Turn the knob while the run is in progress.
    let turner = {
        let knob = Arc::clone(&knob);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(400)).await;
            println!("[knob] widening to 6");
            knob.width.store(6, Ordering::Relaxed);

            tokio::time::sleep(Duration::from_millis(800)).await;
            println!("[knob] narrowing to 1");
            knob.width.store(1, Ordering::Relaxed);
        })
    };

    let spec = RunSpec::new(
        1..=40u32,
        knob,
        |k: &Arc<Knob>| k.width.load(Ordering::Relaxed),
        |id: u32, k: Arc<Arc<Knob>>| async move {
            let jitter = rand::thread_rng().gen_range(0..k.base_ms);
            tokio::time::sleep(Duration::from_millis(k.base_ms + jitter)).await;
            if id == 13 {
                return Err(WorkError::fail(format!("download {id}: checksum mismatch")));
            }
            Ok(u64::from(id) * 1024)
        },
        |r: WorkResult<u32, u64>, _k: Arc<Arc<Knob>>| async move {
            match r.into_result() {
                Ok((id, bytes)) => println!("[handler] #{id:>2} ok ({bytes} bytes)"),
                Err((id, msg)) => println!("[handler] #{id:>2} failed: {msg}"),
            }
            Ok::<_, HandleError>(())
        },
    )
    .with_on_finish(|_k, summary| println!("[done] {summary}"));

    let summary = exec.run(spec).await?;
    turner.abort();

    println!();
    println!("Summary:");
    println!(" ├─► Handled: {}", summary.results_handled);
    println!(" ├─► Failed:  {}", summary.results_failed);
    println!(" ├─► Started: {}", summary.workers_started);
    println!(" ├─► Retired: {}", summary.workers_retired);
    println!(" └─► Peak:    {}", summary.peak_workers);
    Ok(())
}
