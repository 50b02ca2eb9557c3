use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::control::ControlPlane;

/// Runs `sync_inventory` on a fixed interval until shutdown is signalled.
pub struct SyncScheduler {
    control: Arc<ControlPlane>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl SyncScheduler {
    pub fn new(
        control: Arc<ControlPlane>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            control,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        info!("Background sync every {:?}", self.interval);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Consume the first immediate tick
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.sync_once().await,
                _ = self.shutdown.changed() => break,
            }
        }
        info!("Background sync stopped");
    }

    async fn sync_once(&self) {
        let start = Instant::now();
        match self.control.sync_inventory().await {
            Ok(written) => info!("Background sync wrote {} containers", written),
            Err(e) => error!("Background sync failed: {}", e),
        }

        let duration = start.elapsed();
        if duration > self.interval {
            warn!("Background sync took {:?}, longer than its interval", duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRuntime, FakeStorage, runtime_container};

    fn scheduler_parts() -> (Arc<FakeRuntime>, Arc<FakeStorage>, Arc<ControlPlane>) {
        let runtime = Arc::new(FakeRuntime::new(vec![runtime_container(
            "aaaaaaaaaa111",
            "/web",
            "Up 2 days",
        )]));
        let storage = Arc::new(FakeStorage::default());
        let control = Arc::new(ControlPlane::new(
            Arc::clone(&runtime) as _,
            Arc::clone(&storage) as _,
            true,
        ));
        (runtime, storage, control)
    }

    #[tokio::test(start_paused = true)]
    async fn test_syncs_on_each_tick_until_shutdown() {
        let (_runtime, storage, control) = scheduler_parts();
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(SyncScheduler::new(control, Duration::from_secs(60), rx).run());

        tokio::time::sleep(Duration::from_secs(150)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(storage.transactions(), 2);
        assert_eq!(storage.rows().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_sync_does_not_stop_the_loop() {
        let (runtime, storage, control) = scheduler_parts();
        runtime.fail_listing();
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(SyncScheduler::new(control, Duration::from_secs(10), rx).run());

        tokio::time::sleep(Duration::from_secs(35)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(runtime.listings().len(), 3);
        assert_eq!(storage.transactions(), 0);
    }
}
