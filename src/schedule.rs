//! Fixed-interval task scheduling with cooperative shutdown.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

/// Sending half of a shutdown signal.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Signals shutdown to every [`Shutdown`] created from this trigger.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiving half of a shutdown signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Completes once shutdown is triggered or the trigger is dropped.
    pub async fn wait(mut self) {
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}

/// Creates a connected shutdown trigger and receiver.
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Runs `task` every `period` until `shutdown` fires.
///
/// The first run happens one `period` after the call; callers that want an eager
/// run do it before scheduling. Runs never overlap and a run that is in progress
/// when shutdown fires is awaited to completion, after which no further runs are
/// started. A run that takes longer than `period` delays the following ones
/// instead of causing a burst of catch-up runs.
pub async fn run_periodic<F, Fut>(period: Duration, shutdown: Shutdown, mut task: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut stopped = std::pin::pin!(shutdown.wait());

    loop {
        tokio::select! {
            biased;
            _ = &mut stopped => {
                log::debug!("Periodic task stopped");
                break;
            }
            _ = interval.tick() => task().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_task(count: Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<()> {
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_every_period_until_shutdown() {
        let (trigger, shutdown) = shutdown_channel();
        let count = Arc::new(AtomicUsize::new(0));
        let handle = tokio::spawn(run_periodic(
            Duration::from_secs(60),
            shutdown,
            counting_task(Arc::clone(&count)),
        ));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(180)).await;
        trigger.trigger();
        handle.await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 3);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_run_completes_after_shutdown() {
        let (trigger, shutdown) = shutdown_channel();
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let handle = {
            let started = Arc::clone(&started);
            let finished = Arc::clone(&finished);
            tokio::spawn(run_periodic(Duration::from_secs(60), shutdown, move || {
                let started = Arc::clone(&started);
                let finished = Arc::clone(&finished);
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                }
            }))
        };

        tokio::time::sleep(Duration::from_secs(65)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(finished.load(Ordering::SeqCst), 0);

        trigger.trigger();
        handle.await.unwrap();
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_pending_until_triggered() {
        let (_trigger, shutdown) = shutdown_channel();
        let waited = tokio::time::timeout(Duration::from_secs(5), shutdown.wait()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_dropped_trigger_counts_as_shutdown() {
        let (trigger, shutdown) = shutdown_channel();
        drop(trigger);
        shutdown.wait().await;
    }

    #[tokio::test]
    async fn test_trigger_is_visible_to_all_clones() {
        let (trigger, shutdown) = shutdown_channel();
        let other = shutdown.clone();
        trigger.trigger();
        shutdown.wait().await;
        other.wait().await;
    }
}
