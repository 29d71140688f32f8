use chrono::{DateTime, Utc};
use diesel::prelude::*;

use moneta_core::sync::{SyncLog, SyncSettings, SyncStatus, SyncTrigger};

/// Parses a stored RFC3339 timestamp, falling back to the Unix epoch when the
/// column holds an unparseable value.
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn enum_to_db<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn enum_from_db<T: serde::de::DeserializeOwned>(raw: &str, fallback: T) -> T {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).unwrap_or(fallback)
}

#[derive(Queryable, Identifiable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::sync_settings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
// Writes always carry the full row; a None must null the column out.
#[diesel(treat_none_as_null = true)]
pub struct SyncSettingsDB {
    pub id: i32,
    pub enabled: i32,
    pub auto_sync: i32,
    pub sync_interval_minutes: i32,
    pub last_sync_at: Option<String>,
    pub zenith_url: Option<String>,
    pub updated_at: String,
    pub updated_by: Option<String>,
}

impl From<SyncSettingsDB> for SyncSettings {
    fn from(db: SyncSettingsDB) -> Self {
        SyncSettings {
            enabled: db.enabled != 0,
            auto_sync: db.auto_sync != 0,
            sync_interval_minutes: db.sync_interval_minutes,
            last_sync_at: db.last_sync_at.as_deref().map(parse_timestamp),
            zenith_url: db.zenith_url,
            updated_at: parse_timestamp(&db.updated_at),
            updated_by: db.updated_by,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::sync_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncLogDB {
    pub id: String,
    pub sync_type: String,
    pub status: String,
    pub records_synced: i32,
    pub records_failed: i32,
    pub error_details: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub triggered_by: String,
}

impl From<SyncLogDB> for SyncLog {
    fn from(db: SyncLogDB) -> Self {
        SyncLog {
            id: db.id,
            sync_type: db.sync_type,
            status: enum_from_db(&db.status, SyncStatus::Failed),
            records_synced: db.records_synced,
            records_failed: db.records_failed,
            error_details: db
                .error_details
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok()),
            started_at: parse_timestamp(&db.started_at),
            completed_at: db.completed_at.as_deref().map(parse_timestamp),
            triggered_by: enum_from_db(&db.triggered_by, SyncTrigger::Unknown),
        }
    }
}

pub(crate) fn status_to_db(status: SyncStatus) -> String {
    enum_to_db(&status)
}

pub(crate) fn trigger_to_db(trigger: SyncTrigger) -> String {
    enum_to_db(&trigger)
}
