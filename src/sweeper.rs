// Background removal of idle game sessions.

use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreError;
use crate::metrics;
use crate::store::SessionStore;

/// Delete sessions idle for longer than `max_idle` once. Returns how many
/// were removed.
pub async fn sweep_once(store: &dyn SessionStore, max_idle: Duration) -> Result<u64, StoreError> {
    let purged = store.purge_idle(max_idle).await?;
    if purged > 0 {
        metrics::SESSIONS_EXPIRED_TOTAL.inc_by(purged);
        tracing::info!("Session sweeper: removed {purged} idle sessions");
    }
    Ok(purged)
}

/// Spawn a task that sweeps every `interval`. Storage errors are logged and
/// the next tick tries again.
pub fn spawn_session_sweeper(
    store: Arc<dyn SessionStore>,
    max_idle: Duration,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = sweep_once(store.as_ref(), max_idle).await {
                tracing::error!("Session sweeper: {e}");
            }
        }
    })
}
