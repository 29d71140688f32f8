//! Scheduler constants/helpers for automatic Zenith syncs.

use chrono::{DateTime, Duration, Utc};

use super::model::SyncSettings;

/// How often the background scheduler re-checks the settings row.
pub const SYNC_SCHEDULER_TICK_SECS: u64 = 60;

/// Maximum jitter (seconds) added to scheduler ticks.
pub const SYNC_SCHEDULER_JITTER_SECS: u64 = 5;

/// Whether an automatic sync is due under the current settings.
pub fn auto_sync_due(settings: &SyncSettings, now: DateTime<Utc>) -> bool {
    if !settings.enabled || !settings.auto_sync {
        return false;
    }
    match settings.last_sync_at {
        None => true,
        Some(last) => now - last >= Duration::minutes(i64::from(settings.sync_interval_minutes)),
    }
}
