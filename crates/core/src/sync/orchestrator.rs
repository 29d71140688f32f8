//! One-shot replication run against the remote Zenith instance.
//!
//! The orchestrator owns the run lifecycle: watermark load, run log
//! bookkeeping, strictly ordered per-entity replication, and the final
//! status/watermark writes. Entity replication itself is one generic paged
//! loop parameterized by fetch and apply strategies.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde_json::json;
use uuid::Uuid;

use super::model::{
    compute_sync_status, default_watermark, NewSyncLog, RowSyncError, SyncEntity, SyncRunResult,
    SyncStatus, SyncTrigger, SyncedCounts, UpsertOutcome, SYNC_ENTITY_ORDER, ZENITH_SYNC_TYPE,
};
use super::remote::{ZenithCategory, ZenithPaymentMethod, ZenithReminder, ZenithTransaction};
use super::store::{
    CategoryImport, PaymentMethodImport, ReminderImport, ReplicaStore, SyncLogStore,
    SyncSettingsStore, TransactionImport,
};
use super::ZenithSource;
use crate::errors::{Error, Result};

/// Tuning knobs for one run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Remote page size; pagination stops on a short or empty page.
    pub page_size: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { page_size: 100 }
    }
}

/// Remote rows expose their origin id for row-error reporting.
pub trait RemoteRow {
    fn zenith_id(&self) -> &str;
}

impl RemoteRow for ZenithCategory {
    fn zenith_id(&self) -> &str {
        &self.id
    }
}

impl RemoteRow for ZenithPaymentMethod {
    fn zenith_id(&self) -> &str {
        &self.id
    }
}

impl RemoteRow for ZenithTransaction {
    fn zenith_id(&self) -> &str {
        &self.id
    }
}

impl RemoteRow for ZenithReminder {
    fn zenith_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Default)]
struct EntityTally {
    synced: usize,
    row_errors: Vec<RowSyncError>,
}

pub struct SyncOrchestrator {
    settings: Arc<dyn SyncSettingsStore>,
    logs: Arc<dyn SyncLogStore>,
    replica: Arc<dyn ReplicaStore>,
    config: SyncConfig,
}

impl SyncOrchestrator {
    pub fn new(
        settings: Arc<dyn SyncSettingsStore>,
        logs: Arc<dyn SyncLogStore>,
        replica: Arc<dyn ReplicaStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            settings,
            logs,
            replica,
            config,
        }
    }

    /// Run one full replication pass.
    ///
    /// `source` is `None` when the Zenith credentials are unconfigured; the
    /// run is then recorded as failed and no entity sync is attempted. A
    /// completed run (any status) advances the watermark to its start time;
    /// failed entity types are simply re-read in full next run, which is safe
    /// because the row-level upserts are idempotent.
    pub async fn run(
        &self,
        source: Option<&dyn ZenithSource>,
        trigger: SyncTrigger,
    ) -> Result<SyncRunResult> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        let settings = self.settings.get()?;
        let watermark = settings.last_sync_at.unwrap_or_else(default_watermark);

        // Placeholder row first, so a crash mid-run still leaves an auditable
        // non-success record.
        self.logs
            .insert_started(NewSyncLog {
                id: run_id.clone(),
                sync_type: ZENITH_SYNC_TYPE.to_string(),
                started_at,
                triggered_by: trigger,
            })
            .await?;

        let Some(source) = source else {
            let message = "Zenith URL or service token is not configured".to_string();
            self.logs
                .finalize(
                    run_id,
                    SyncStatus::Failed,
                    0,
                    0,
                    Some(json!({ "errors": [message.clone()] })),
                    Utc::now(),
                )
                .await?;
            return Err(Error::configuration(message));
        };

        info!(
            "[ZenithSync] Run {} started (trigger={:?}, watermark={})",
            run_id,
            trigger,
            watermark.to_rfc3339()
        );

        let mut synced = SyncedCounts::default();
        let mut errors: Vec<String> = Vec::new();
        let mut row_errors: Vec<RowSyncError> = Vec::new();

        for entity in SYNC_ENTITY_ORDER {
            match self.replicate_entity(source, entity, watermark).await {
                Ok(tally) => {
                    synced.record(entity, tally.synced);
                    row_errors.extend(tally.row_errors);
                }
                Err(err) => {
                    error!(
                        "[ZenithSync] Entity sync failed for {}: {}",
                        entity.table_name(),
                        err
                    );
                    errors.push(format!("{}: {}", entity.table_name(), err));
                }
            }
        }

        let status = compute_sync_status(synced.total(), errors.len());
        let error_details = if errors.is_empty() && row_errors.is_empty() {
            None
        } else {
            Some(json!({ "errors": errors, "rowErrors": row_errors }))
        };
        let completed_at = Utc::now();

        self.logs
            .finalize(
                run_id.clone(),
                status,
                synced.total() as i32,
                row_errors.len() as i32,
                error_details,
                completed_at,
            )
            .await?;

        self.settings.advance_watermark(started_at).await?;

        info!(
            "[ZenithSync] Run {} completed: status={:?} synced={} failed_rows={} entity_errors={}",
            run_id,
            status,
            synced.total(),
            row_errors.len(),
            errors.len()
        );

        Ok(SyncRunResult {
            success: errors.is_empty(),
            status,
            synced,
            errors,
            row_errors,
            timestamp: completed_at,
        })
    }

    async fn replicate_entity(
        &self,
        source: &dyn ZenithSource,
        entity: SyncEntity,
        watermark: DateTime<Utc>,
    ) -> Result<EntityTally> {
        let limit = self.config.page_size;
        let replica = self.replica.as_ref();

        match entity {
            SyncEntity::Category => {
                self.replicate_pages(
                    entity,
                    |offset| source.fetch_categories(watermark, limit, offset),
                    |row: ZenithCategory| async move {
                        replica.upsert_category(CategoryImport::from(row)).await
                    },
                )
                .await
            }
            SyncEntity::PaymentMethod => {
                self.replicate_pages(
                    entity,
                    |offset| source.fetch_payment_methods(watermark, limit, offset),
                    |row: ZenithPaymentMethod| async move {
                        replica
                            .upsert_payment_method(PaymentMethodImport::from(row))
                            .await
                    },
                )
                .await
            }
            SyncEntity::Transaction => {
                self.replicate_pages(
                    entity,
                    |offset| source.fetch_transactions(watermark, limit, offset),
                    |row: ZenithTransaction| async move {
                        let import = map_transaction(replica, row)?;
                        replica.upsert_transaction(import).await
                    },
                )
                .await
            }
            SyncEntity::Reminder => {
                self.replicate_pages(
                    entity,
                    |offset| source.fetch_reminders(watermark, limit, offset),
                    |row: ZenithReminder| async move {
                        replica.upsert_reminder(ReminderImport::from(row)).await
                    },
                )
                .await
            }
        }
    }

    /// Shared paged replication loop.
    ///
    /// Fetch errors abort the entity (caught at the run level); apply errors
    /// skip the row only; the row still satisfies the watermark filter and
    /// is retried on the next run.
    async fn replicate_pages<T, FetchFut, ApplyFut>(
        &self,
        entity: SyncEntity,
        fetch: impl Fn(i64) -> FetchFut,
        apply: impl Fn(T) -> ApplyFut,
    ) -> Result<EntityTally>
    where
        T: RemoteRow,
        FetchFut: Future<Output = Result<Vec<T>>>,
        ApplyFut: Future<Output = Result<UpsertOutcome>>,
    {
        let mut tally = EntityTally::default();
        let mut offset = 0i64;

        loop {
            let page = fetch(offset).await?;
            if page.is_empty() {
                break;
            }
            let page_len = page.len() as i64;

            for row in page {
                let zenith_id = row.zenith_id().to_string();
                match apply(row).await {
                    Ok(outcome) => {
                        if outcome.counts_as_synced() {
                            tally.synced += 1;
                        }
                    }
                    Err(err) => {
                        warn!(
                            "[ZenithSync] Skipping {} row {}: {}",
                            entity.table_name(),
                            zenith_id,
                            err
                        );
                        tally.row_errors.push(RowSyncError {
                            entity,
                            zenith_id,
                            reason: err.to_string(),
                        });
                    }
                }
            }

            // A short page means the remote has no further rows.
            if page_len < self.config.page_size {
                break;
            }
            offset += page_len;
        }

        Ok(tally)
    }
}

fn map_transaction(replica: &dyn ReplicaStore, row: ZenithTransaction) -> Result<TransactionImport> {
    let category_id = match row.category_id.as_deref() {
        Some(remote_id) => replica.resolve_category_id(remote_id, &row.user_id)?,
        None => None,
    };
    let payment_method_id = match row.payment_method_id.as_deref() {
        Some(remote_id) => replica.resolve_payment_method_id(remote_id, &row.user_id)?,
        None => None,
    };

    Ok(TransactionImport {
        zenith_id: row.id,
        user_id: row.user_id,
        description: row.description,
        amount: row.amount,
        transaction_date: row.transaction_date,
        category_id,
        payment_method_id,
        notes: row.notes,
        remote_created_at: row.created_at,
    })
}

impl From<ZenithCategory> for CategoryImport {
    fn from(row: ZenithCategory) -> Self {
        Self {
            zenith_id: row.id,
            user_id: row.user_id,
            name: row.name,
            color: row.color,
            icon: row.icon,
            remote_created_at: row.created_at,
        }
    }
}

impl From<ZenithPaymentMethod> for PaymentMethodImport {
    fn from(row: ZenithPaymentMethod) -> Self {
        Self {
            zenith_id: row.id,
            user_id: row.user_id,
            name: row.name,
            method_type: row.method_type,
            remote_created_at: row.created_at,
        }
    }
}

impl From<ZenithReminder> for ReminderImport {
    fn from(row: ZenithReminder) -> Self {
        Self {
            zenith_id: row.id,
            user_id: row.user_id,
            title: row.title,
            due_date: row.due_date,
            amount: row.amount,
            is_paid: row.is_paid,
            notes: row.notes,
            remote_created_at: row.created_at,
        }
    }
}
