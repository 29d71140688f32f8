//! Background task driving automatic syncs off the settings row.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use moneta_core::sync::{
    auto_sync_due, SyncSettingsStore, SyncTrigger, SYNC_SCHEDULER_JITTER_SECS,
    SYNC_SCHEDULER_TICK_SECS,
};

use crate::state::AppState;

pub fn spawn(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(SYNC_SCHEDULER_TICK_SECS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Sync scheduler started (tick every {}s)", SYNC_SCHEDULER_TICK_SECS);

        loop {
            ticker.tick().await;
            let now = Utc::now();

            let settings = match state.settings.get() {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("Scheduler could not load sync settings: {}", e);
                    continue;
                }
            };
            if !auto_sync_due(&settings, now) {
                continue;
            }

            // Deterministic jitter; keeps multiple instances pointed at the
            // same Zenith from syncing on the exact same second.
            let jitter = (now.timestamp() as u64) % SYNC_SCHEDULER_JITTER_SECS;
            if jitter > 0 {
                sleep(Duration::from_secs(jitter)).await;
            }

            let Ok(_guard) = state.run_lock.try_lock() else {
                debug!("Scheduler skipping tick; a sync run is already in progress");
                continue;
            };

            match state.run_sync(SyncTrigger::Cron).await {
                Ok(result) => info!(
                    "Scheduled sync finished: status={:?} synced={}",
                    result.status,
                    result.synced.total()
                ),
                Err(e) => error!("Scheduled sync failed: {}", e),
            }
        }
    });
}
