//! Periodic idle-session eviction.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::sse::hub::BroadcastHub;

/// Spawn the reaper. Every `interval` it evicts sessions idle for longer
/// than `idle_timeout`; the hub publishes when anything was removed.
/// Stops when `token` is cancelled.
pub fn spawn_reaper(
    hub: Arc<BroadcastHub>,
    idle_timeout: Duration,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    let max_idle_ms = u64::try_from(idle_timeout.as_millis()).unwrap_or(u64::MAX);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        let _ = ticker.tick().await;

        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = hub.evict_idle(max_idle_ms);
                    if !removed.is_empty() {
                        info!(count = removed.len(), ?removed, "evicted idle sessions");
                    }
                }
            }
        }
        debug!("reaper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccdash_core::HookPayload;

    #[tokio::test]
    async fn evicts_idle_sessions() {
        let hub = Arc::new(BroadcastHub::new(8));
        let _ = hub.ingest(&HookPayload::new("s1", "UserPromptSubmit"));
        let token = CancellationToken::new();

        let handle = spawn_reaper(
            hub.clone(),
            Duration::from_millis(20),
            Duration::from_millis(10),
            token.clone(),
        );

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(hub.session_count(), 0);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn keeps_fresh_sessions() {
        let hub = Arc::new(BroadcastHub::new(8));
        let _ = hub.ingest(&HookPayload::new("s1", "Stop"));
        let token = CancellationToken::new();

        let handle = spawn_reaper(
            hub.clone(),
            Duration::from_secs(60),
            Duration::from_millis(10),
            token.clone(),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hub.session_count(), 1);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn stops_on_cancel() {
        let hub = Arc::new(BroadcastHub::new(8));
        let token = CancellationToken::new();
        let handle = spawn_reaper(hub, Duration::from_secs(1), Duration::from_secs(60), token.clone());

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
