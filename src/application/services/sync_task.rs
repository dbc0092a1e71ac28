//! Periodic availability sweep
//!
//! Heals counters whose last write failed by reconciling every location
//! on a fixed interval.

use std::time::Duration;

use tracing::{info, warn};

use super::availability::AvailabilityReconciler;
use crate::shared::shutdown::ShutdownSignal;

/// Spawn the sweep. `interval_secs == 0` disables it and returns `None`.
pub fn start_availability_sync_task(
    reconciler: AvailabilityReconciler,
    shutdown: ShutdownSignal,
    interval_secs: u64,
) -> Option<tokio::task::JoinHandle<()>> {
    if interval_secs == 0 {
        info!("Availability sweep disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        info!(interval_secs, "Availability sweep started");
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick fires immediately; skip it so startup is not delayed.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = reconciler.reconcile_all().await {
                        warn!(error = %e, "Availability sweep failed");
                    }
                }
                _ = shutdown.wait() => {
                    info!("Availability sweep shutting down");
                    break;
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::fixture;

    #[tokio::test]
    async fn zero_interval_disables_the_sweep() {
        let fx = fixture(1).await;
        assert!(start_availability_sync_task(fx.reconciler.clone(), ShutdownSignal::new(), 0).is_none());
    }

    #[tokio::test]
    async fn sweep_heals_and_stops_on_shutdown() {
        let fx = fixture(4).await;
        fx.book("P1").await;
        fx.repos
            .locations()
            .set_available_slots(fx.location.id, 0)
            .await
            .unwrap();

        let shutdown = ShutdownSignal::new();
        let handle =
            start_availability_sync_task(fx.reconciler.clone(), shutdown.clone(), 1).unwrap();

        let mut healed = false;
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if fx.available().await == 3 {
                healed = true;
                break;
            }
        }
        assert!(healed);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
