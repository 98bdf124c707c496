//! Periodic removal of expired payment requests.

use std::sync::Arc;
use std::time::Duration;

use solpick::UnixTimestamp;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::store::PaymentStore;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Spawns a task on `tracker` that calls [`PaymentStore::sweep_expired`]
/// every `interval` until `cancel` fires.
///
/// The first sweep runs one full interval after start. Intervals shorter
/// than one second are raised to one second.
pub fn spawn_sweeper(
    tracker: &TaskTracker,
    store: Arc<dyn PaymentStore>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let interval = interval.max(MIN_INTERVAL);
    tracker.spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            match store.sweep_expired(UnixTimestamp::now()).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "Deleted expired payment requests"),
                Err(e) => tracing::error!(error = %e, "Expired payment sweep failed"),
            }
        }
        tracing::debug!("Payment sweeper stopped");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, PaymentRecord};
    use solpick_svm::chain::Address;

    #[tokio::test(start_paused = true)]
    async fn test_sweeps_on_interval_and_stops() {
        let store = Arc::new(MemoryStore::new(Duration::from_secs(1_800)));
        let mut stale = PaymentRecord::new(
            Address::from_bytes([1; 32]),
            Address::from_bytes([2; 32]),
            "1".parse().unwrap(),
        );
        stale.created_at = UnixTimestamp::from_secs(UnixTimestamp::now().as_secs() - 7_200);
        store.create(stale).await.unwrap();

        let tracker = TaskTracker::new();
        let cancel = CancellationToken::new();
        spawn_sweeper(
            &tracker,
            Arc::clone(&store) as Arc<dyn PaymentStore>,
            Duration::from_secs(600),
            cancel.clone(),
        );
        tracker.close();

        tokio::time::sleep(Duration::from_secs(599)).await;
        assert_eq!(store.len(), 1);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.len(), 0);

        cancel.cancel();
        tracker.wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_still_sweeps() {
        let store = Arc::new(MemoryStore::new(Duration::from_secs(1_800)));
        let mut stale = PaymentRecord::new(
            Address::from_bytes([1; 32]),
            Address::from_bytes([2; 32]),
            "1".parse().unwrap(),
        );
        stale.created_at = UnixTimestamp::from_secs(UnixTimestamp::now().as_secs() - 7_200);
        store.create(stale).await.unwrap();

        let tracker = TaskTracker::new();
        let cancel = CancellationToken::new();
        spawn_sweeper(
            &tracker,
            Arc::clone(&store) as Arc<dyn PaymentStore>,
            Duration::ZERO,
            cancel.clone(),
        );
        tracker.close();

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(store.len(), 0);

        cancel.cancel();
        tracker.wait().await;
        assert!(tracker.is_empty());
    }
}
