use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::batch::BatchScheduler;
use crate::config::Config;
use crate::cycler::RequestCycler;
use crate::dispatcher::{Dispatcher, RequestSender};
use crate::error::StartError;
use crate::stats::{StatsCollector, StatsSnapshot};

/// One run's coordination handles. `cancel` asks the run to stop; `done`
/// fires once the run task has fully wound down and logged final stats.
struct RunHandle {
    cancel: CancellationToken,
    done: CancellationToken,
}

/// Owns the continuous run loop: batches alternating with an inter-batch
/// pause, a periodic stats reporter beside them, and an enable gate that
/// pauses batch launches without ending the run.
pub struct ContinuousRunner {
    config: Config,
    sender: Arc<dyn RequestSender>,
    stats: Arc<StatsCollector>,
    enabled: Arc<AtomicBool>,
    active: Mutex<Option<RunHandle>>,
}

impl ContinuousRunner {
    pub fn new(config: Config, sender: Arc<dyn RequestSender>) -> Self {
        Self {
            config,
            sender,
            stats: Arc::new(StatsCollector::new()),
            enabled: Arc::new(AtomicBool::new(true)),
            active: Mutex::new(None),
        }
    }

    /// Begins a new continuous run.
    ///
    /// Rejects with `AlreadyRunning` while a previous run is active or still
    /// winding down: two overlapping runs would share counters and cursor.
    /// The configuration is validated before any state changes, so a bad
    /// config never reaches the loop.
    pub fn start(&self) -> Result<(), StartError> {
        let mut active = self.active.lock();
        if let Some(run) = active.as_ref() {
            if !run.done.is_cancelled() {
                return Err(StartError::AlreadyRunning);
            }
        }
        self.config.validate()?;

        self.stats.reset();

        let cancel = CancellationToken::new();
        let done = CancellationToken::new();

        let config = self.config.clone();
        let sender = self.sender.clone();
        let stats = self.stats.clone();
        let enabled = self.enabled.clone();
        let run_cancel = cancel.clone();
        let run_done = done.clone();
        tokio::spawn(async move {
            run(config, sender, stats, enabled, run_cancel).await;
            run_done.cancel();
        });

        *active = Some(RunHandle { cancel, done });
        Ok(())
    }

    /// Signals the active run to stop and returns immediately; wind-down is
    /// observed through `stopped`. No-op when idle.
    pub fn stop(&self) {
        let active = self.active.lock();
        if let Some(run) = active.as_ref() {
            run.cancel.cancel();
        }
    }

    /// Gates batch launches. Persists across runs and may flip at any time;
    /// disabling pauses new batches without touching counters, cursor or
    /// the reporter, and re-enabling resumes where the cycle left off.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|run| !run.done.is_cancelled())
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Resolves once the active run has fully wound down; resolves
    /// immediately when idle.
    pub async fn stopped(&self) {
        let done = self.active.lock().as_ref().map(|run| run.done.clone());
        if let Some(done) = done {
            done.cancelled().await;
        }
    }
}

/// The run task: the batch loop plus the stats reporter, both under one
/// cancellation token. Winds both down on cancellation, then logs the
/// run-stopped notice and one final snapshot.
async fn run(
    config: Config,
    sender: Arc<dyn RequestSender>,
    stats: Arc<StatsCollector>,
    enabled: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    let cycler = RequestCycler::new(config.requests.clone().into());
    let dispatcher = Arc::new(Dispatcher::new(sender, stats.clone()));
    let mut scheduler = BatchScheduler::new(
        dispatcher,
        cycler,
        config.batch.size,
        config.batch.intra_delay(),
    );

    let reporter = tokio::spawn(report_stats(
        stats.clone(),
        config.report.interval(),
        cancel.clone(),
    ));

    let inter_delay = config.batch.inter_delay();
    while !cancel.is_cancelled() {
        // One flag read per iteration; a flip mid-batch applies from the
        // next iteration on.
        if enabled.load(Ordering::Relaxed) {
            scheduler.run_batch(&cancel).await;
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(inter_delay) => {}
        }
    }

    let _ = reporter.await;

    info!("continuous run stopped");
    let snapshot = stats.snapshot();
    info!(
        sent = snapshot.sent,
        succeeded = snapshot.succeeded,
        failed = snapshot.failed,
        "final stats"
    );
}

/// Logs a snapshot every `interval` until cancelled. Runs beside the batch
/// loop and keeps its own cadence whatever the enable gate does.
async fn report_stats(stats: Arc<StatsCollector>, interval: Duration, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(interval) => {
                let snapshot = stats.snapshot();
                info!(
                    sent = snapshot.sent,
                    succeeded = snapshot.succeeded,
                    failed = snapshot.failed,
                    "stats"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BatchConfig, Method, ReportConfig, RequestSpec, TargetConfig};
    use crate::dispatcher::MockSender;
    use crate::error::ConfigError;

    fn test_config(endpoints: &[&str], size: u32, intra_ms: u64, inter_ms: u64) -> Config {
        Config {
            target: TargetConfig {
                base_url: "http://127.0.0.1:3000".to_string(),
                timeout_ms: 1000,
            },
            batch: BatchConfig {
                size,
                intra_delay_ms: intra_ms,
                inter_delay_ms: inter_ms,
            },
            report: ReportConfig { interval_ms: 50 },
            requests: endpoints
                .iter()
                .map(|endpoint| RequestSpec {
                    endpoint: endpoint.to_string(),
                    method: Method::Get,
                    body: None,
                })
                .collect(),
        }
    }

    fn mock_runner(config: Config) -> ContinuousRunner {
        ContinuousRunner::new(config, Arc::new(MockSender::new(Duration::ZERO)))
    }

    async fn wait_until(runner: &ContinuousRunner, check: impl Fn(StatsSnapshot) -> bool) {
        for _ in 0..400 {
            if check(runner.stats()) {
                return;
            }
            sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not met in time, stats={:?}", runner.stats());
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let runner = mock_runner(test_config(&["a"], 1, 0, 10));

        runner.start().unwrap();
        assert_eq!(runner.start(), Err(StartError::AlreadyRunning));

        runner.stop();
        runner.stopped().await;
        assert!(!runner.is_running());

        // A fully wound-down runner accepts a fresh start.
        runner.start().unwrap();
        runner.stop();
        runner.stopped().await;
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_config() {
        let runner = mock_runner(test_config(&[], 1, 0, 10));

        assert_eq!(
            runner.start(),
            Err(StartError::InvalidConfig(ConfigError::NoRequests))
        );
        assert!(!runner.is_running());
    }

    #[tokio::test]
    async fn test_batches_complete_and_totals_reconcile() {
        let runner = mock_runner(test_config(&["a", "b", "c"], 3, 0, 10_000));

        runner.start().unwrap();
        wait_until(&runner, |stats| {
            stats.sent == 3 && stats.succeeded + stats.failed == 3
        })
        .await;

        runner.stop();
        runner.stopped().await;
        assert_eq!(runner.stats().succeeded, 3);
    }

    #[tokio::test]
    async fn test_disable_pauses_batches_without_stopping_the_run() {
        let runner = mock_runner(test_config(&["a"], 2, 0, 10));
        runner.set_enabled(false);

        runner.start().unwrap();
        sleep(Duration::from_millis(80)).await;
        assert_eq!(runner.stats().sent, 0);
        assert!(runner.is_running());

        runner.set_enabled(true);
        wait_until(&runner, |stats| stats.sent >= 2).await;

        runner.stop();
        runner.stopped().await;
    }

    #[tokio::test]
    async fn test_stop_mid_batch_halts_launching() {
        let runner = mock_runner(test_config(&["a", "b", "c"], 100, 10, 10_000));

        runner.start().unwrap();
        sleep(Duration::from_millis(50)).await;
        runner.stop();
        runner.stopped().await;

        let stats = runner.stats();
        assert!(stats.sent >= 1);
        assert!(stats.sent < 100, "sent={}", stats.sent);
        assert!(!runner.is_running());
    }

    #[tokio::test]
    async fn test_restart_resets_counters() {
        let runner = mock_runner(test_config(&["a"], 2, 0, 10));

        runner.start().unwrap();
        wait_until(&runner, |stats| stats.sent >= 2).await;
        runner.stop();
        runner.stopped().await;
        assert!(runner.stats().sent >= 2);

        runner.set_enabled(false);
        runner.start().unwrap();
        assert_eq!(runner.stats(), StatsSnapshot::default());

        runner.stop();
        runner.stopped().await;
    }

    #[tokio::test]
    async fn test_stopped_resolves_immediately_when_idle() {
        let runner = mock_runner(test_config(&["a"], 1, 0, 10));
        runner.stopped().await;
        assert!(!runner.is_running());
    }
}
