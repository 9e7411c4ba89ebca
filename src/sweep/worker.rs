use crate::core::{DeletionError, Result};
use crate::facade::DeletionWorkflow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{error, info, warn};

/// Background task running the sweep on a fixed cadence.
///
/// Dropping the handle aborts the task; [`SweepWorker::stop`] lets a sweep
/// in progress finish first.
pub struct SweepWorker {
    runs: Arc<AtomicU64>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SweepWorker {
    /// Number of sweeps completed so far.
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }

    /// Ask the worker to finish and wait for it. Returns the number of sweeps
    /// it completed.
    pub async fn stop(mut self) -> Result<u64> {
        self.shutdown.send_replace(true);
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|err| DeletionError::Worker(format!("sweep task ended abnormally: {}", err)))?;
        }
        Ok(self.runs())
    }
}

impl Drop for SweepWorker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawns a task that sweeps every `period` until stopped.
///
/// The first sweep runs one `period` after spawning. A sweep that overruns
/// its slot delays the next one rather than triggering a burst.
pub fn spawn_sweep_worker(workflow: Arc<DeletionWorkflow>, period: Duration) -> SweepWorker {
    let period = period.max(Duration::from_millis(10));
    let (shutdown, mut shutdown_rx) = watch::channel(false);
    let runs = Arc::new(AtomicU64::new(0));
    let counter = runs.clone();

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = ticker.tick() => {
                    match workflow.sweep().await {
                        Ok(report) if !report.is_clean() => {
                            warn!(failures = report.failures.len(), "sweep finished with failures");
                        }
                        Ok(_) => {}
                        Err(err) => error!(error = %err, "sweep aborted"),
                    }
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }
        }
        info!(runs = counter.load(Ordering::SeqCst), "sweep worker stopped");
    });

    SweepWorker {
        runs,
        shutdown,
        task: Some(task),
    }
}
