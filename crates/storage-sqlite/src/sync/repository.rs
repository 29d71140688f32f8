use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use moneta_core::sync::{NewSyncLog, SyncLog, SyncSettings, SyncSettingsStore, SyncStatus};
use moneta_core::sync::SyncLogStore;
use moneta_core::Result;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{sync_logs, sync_settings};

use super::model::{status_to_db, trigger_to_db, SyncLogDB, SyncSettingsDB};

const SETTINGS_ROW_ID: i32 = 1;

/// Partial update applied to the singleton settings row.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettingsUpdate {
    pub enabled: Option<bool>,
    pub auto_sync: Option<bool>,
    pub sync_interval_minutes: Option<i32>,
    pub zenith_url: Option<Option<String>>,
    pub updated_by: Option<String>,
}

pub struct SyncSettingsRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncSettingsRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Apply a partial update and return the resulting settings.
    pub async fn update_settings(&self, update: SyncSettingsUpdate) -> Result<SyncSettings> {
        self.writer
            .exec(move |conn| {
                let mut row = load_settings_row(conn)?;

                if let Some(enabled) = update.enabled {
                    row.enabled = enabled as i32;
                }
                if let Some(auto_sync) = update.auto_sync {
                    row.auto_sync = auto_sync as i32;
                }
                if let Some(interval) = update.sync_interval_minutes {
                    row.sync_interval_minutes = interval.max(1);
                }
                if let Some(url) = update.zenith_url {
                    row.zenith_url = url.filter(|u| !u.trim().is_empty());
                }
                if let Some(updated_by) = update.updated_by {
                    row.updated_by = Some(updated_by);
                }
                row.updated_at = Utc::now().to_rfc3339();

                diesel::update(sync_settings::table.find(SETTINGS_ROW_ID))
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(SyncSettings::from(row))
            })
            .await
    }
}

/// Load the settings row, inserting the default when the seed row is missing.
fn load_settings_row(conn: &mut SqliteConnection) -> Result<SyncSettingsDB> {
    if let Some(row) = sync_settings::table
        .find(SETTINGS_ROW_ID)
        .first::<SyncSettingsDB>(conn)
        .optional()
        .map_err(StorageError::from)?
    {
        return Ok(row);
    }

    let defaults = SyncSettingsDB {
        id: SETTINGS_ROW_ID,
        enabled: 1,
        auto_sync: 0,
        sync_interval_minutes: 60,
        last_sync_at: None,
        zenith_url: None,
        updated_at: Utc::now().to_rfc3339(),
        updated_by: None,
    };
    diesel::insert_into(sync_settings::table)
        .values((
            sync_settings::id.eq(defaults.id),
            sync_settings::enabled.eq(defaults.enabled),
            sync_settings::auto_sync.eq(defaults.auto_sync),
            sync_settings::sync_interval_minutes.eq(defaults.sync_interval_minutes),
            sync_settings::updated_at.eq(defaults.updated_at.clone()),
        ))
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(defaults)
}

#[async_trait]
impl SyncSettingsStore for SyncSettingsRepository {
    fn get(&self) -> Result<SyncSettings> {
        let mut conn = get_connection(&self.pool)?;
        let row = sync_settings::table
            .find(SETTINGS_ROW_ID)
            .first::<SyncSettingsDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        match row {
            Some(row) => Ok(SyncSettings::from(row)),
            // The migration seeds the row; tolerate a wiped table anyway.
            None => Ok(SyncSettings {
                enabled: true,
                auto_sync: false,
                sync_interval_minutes: 60,
                last_sync_at: None,
                zenith_url: None,
                updated_at: Utc::now(),
                updated_by: None,
            }),
        }
    }

    async fn advance_watermark(&self, last_sync_at: DateTime<Utc>) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let row = load_settings_row(conn)?;

                let current = row
                    .last_sync_at
                    .as_deref()
                    .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                    .map(|dt| dt.with_timezone(&Utc));
                if matches!(current, Some(existing) if existing >= last_sync_at) {
                    return Ok(());
                }

                diesel::update(sync_settings::table.find(SETTINGS_ROW_ID))
                    .set((
                        sync_settings::last_sync_at.eq(Some(last_sync_at.to_rfc3339())),
                        sync_settings::updated_at.eq(Utc::now().to_rfc3339()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}

pub struct SyncLogRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncLogRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Most recent run logs, newest first.
    pub fn list_recent(&self, limit: i64) -> Result<Vec<SyncLog>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = sync_logs::table
            .order(sync_logs::started_at.desc())
            .limit(limit.clamp(1, 500))
            .load::<SyncLogDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(SyncLog::from).collect())
    }

    pub fn get_latest(&self) -> Result<Option<SyncLog>> {
        let mut conn = get_connection(&self.pool)?;
        let row = sync_logs::table
            .order(sync_logs::started_at.desc())
            .first::<SyncLogDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(SyncLog::from))
    }
}

#[async_trait]
impl SyncLogStore for SyncLogRepository {
    async fn insert_started(&self, log: NewSyncLog) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let row = SyncLogDB {
                    id: log.id,
                    sync_type: log.sync_type,
                    status: status_to_db(SyncStatus::Partial),
                    records_synced: 0,
                    records_failed: 0,
                    error_details: None,
                    started_at: log.started_at.to_rfc3339(),
                    completed_at: None,
                    triggered_by: trigger_to_db(log.triggered_by),
                };
                diesel::insert_into(sync_logs::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn finalize(
        &self,
        log_id: String,
        status: SyncStatus,
        records_synced: i32,
        records_failed: i32,
        error_details: Option<serde_json::Value>,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let details = error_details
                    .map(|value| serde_json::to_string(&value))
                    .transpose()?;
                diesel::update(sync_logs::table.find(&log_id))
                    .set((
                        sync_logs::status.eq(status_to_db(status)),
                        sync_logs::records_synced.eq(records_synced),
                        sync_logs::records_failed.eq(records_failed),
                        sync_logs::error_details.eq(details),
                        sync_logs::completed_at.eq(Some(completed_at.to_rfc3339())),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
