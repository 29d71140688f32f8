//! Zenith sync domain models and pure helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed replication order for one sync run.
///
/// Categories and payment methods must complete before transactions so the
/// foreign-key remap can resolve against freshly replicated rows.
pub const SYNC_ENTITY_ORDER: [SyncEntity; 4] = [
    SyncEntity::Category,
    SyncEntity::PaymentMethod,
    SyncEntity::Transaction,
    SyncEntity::Reminder,
];

/// Sync type recorded on every run log row.
pub const ZENITH_SYNC_TYPE: &str = "zenith";

/// Record kinds replicated from the Zenith instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncEntity {
    Category,
    PaymentMethod,
    Transaction,
    Reminder,
}

impl SyncEntity {
    /// Local destination table name.
    pub fn table_name(&self) -> &'static str {
        match self {
            SyncEntity::Category => "categories",
            SyncEntity::PaymentMethod => "payment_methods",
            SyncEntity::Transaction => "transactions",
            SyncEntity::Reminder => "reminders",
        }
    }
}

/// What started a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    Manual,
    Cron,
    Unknown,
}

/// Final status of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Partial,
    Failed,
}

/// Status rule: no errors is success, errors with some progress is partial,
/// errors with zero progress is failed.
pub fn compute_sync_status(total_synced: usize, error_count: usize) -> SyncStatus {
    if error_count == 0 {
        SyncStatus::Success
    } else if total_synced > 0 {
        SyncStatus::Partial
    } else {
        SyncStatus::Failed
    }
}

/// Singleton sync configuration row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    pub enabled: bool,
    pub auto_sync: bool,
    pub sync_interval_minutes: i32,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub zenith_url: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

/// Audit row for one sync run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLog {
    pub id: String,
    pub sync_type: String,
    pub status: SyncStatus,
    pub records_synced: i32,
    pub records_failed: i32,
    pub error_details: Option<serde_json::Value>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub triggered_by: SyncTrigger,
}

/// Payload for inserting the run-start placeholder log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSyncLog {
    pub id: String,
    pub sync_type: String,
    pub started_at: DateTime<Utc>,
    pub triggered_by: SyncTrigger,
}

/// Per-entity counters returned by a sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedCounts {
    pub categories: usize,
    pub payment_methods: usize,
    pub transactions: usize,
    pub reminders: usize,
}

impl SyncedCounts {
    pub fn total(&self) -> usize {
        self.categories + self.payment_methods + self.transactions + self.reminders
    }

    pub fn record(&mut self, entity: SyncEntity, count: usize) {
        match entity {
            SyncEntity::Category => self.categories = count,
            SyncEntity::PaymentMethod => self.payment_methods = count,
            SyncEntity::Transaction => self.transactions = count,
            SyncEntity::Reminder => self.reminders = count,
        }
    }
}

/// A single skipped row, surfaced in the aggregate result instead of being
/// swallowed at the page loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSyncError {
    pub entity: SyncEntity,
    pub zenith_id: String,
    pub reason: String,
}

/// Aggregate outcome of one sync run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRunResult {
    pub success: bool,
    pub status: SyncStatus,
    pub synced: SyncedCounts,
    pub errors: Vec<String>,
    pub row_errors: Vec<RowSyncError>,
    pub timestamp: DateTime<Utc>,
}

/// Result of one local upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// Existing local row was at least as new as the remote row.
    Unchanged,
}

impl UpsertOutcome {
    pub fn counts_as_synced(&self) -> bool {
        matches!(self, UpsertOutcome::Inserted | UpsertOutcome::Updated)
    }
}

/// Watermark used when the settings row has never recorded a sync: far enough
/// in the past that the first run replicates everything.
pub fn default_watermark() -> DateTime<Utc> {
    // 2000-01-01T00:00:00Z
    DateTime::from_timestamp(946_684_800, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Row-level conflict policy: the remote row wins only when it is strictly
/// newer than the local row's last update.
///
/// Both sides are RFC3339 strings as persisted; falls back to lexical
/// comparison when either side fails to parse.
pub fn remote_wins(remote_created_at: &str, local_updated_at: &str) -> bool {
    let remote = DateTime::parse_from_rfc3339(remote_created_at).map(|dt| dt.timestamp_millis());
    let local = DateTime::parse_from_rfc3339(local_updated_at).map(|dt| dt.timestamp_millis());

    match (remote, local) {
        (Ok(remote_ms), Ok(local_ms)) => remote_ms > local_ms,
        _ => remote_created_at > local_updated_at,
    }
}
