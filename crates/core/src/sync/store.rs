//! Local store seams consumed by the orchestrator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::model::{NewSyncLog, SyncSettings, SyncStatus, UpsertOutcome};
use crate::errors::Result;

/// Mapped category row ready for the local upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryImport {
    pub zenith_id: String,
    pub user_id: String,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub remote_created_at: String,
}

/// Mapped payment method row ready for the local upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentMethodImport {
    pub zenith_id: String,
    pub user_id: String,
    pub name: String,
    pub method_type: Option<String>,
    pub remote_created_at: String,
}

/// Mapped transaction row ready for the local upsert.
///
/// `category_id` / `payment_method_id` are already local ids (or None when
/// the remote reference could not be resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionImport {
    pub zenith_id: String,
    pub user_id: String,
    pub description: String,
    pub amount: Decimal,
    pub transaction_date: String,
    pub category_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub notes: Option<String>,
    pub remote_created_at: String,
}

/// Mapped reminder row ready for the local upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderImport {
    pub zenith_id: String,
    pub user_id: String,
    pub title: String,
    pub due_date: String,
    pub amount: Option<Decimal>,
    pub is_paid: bool,
    pub notes: Option<String>,
    pub remote_created_at: String,
}

/// Access to the singleton sync settings row.
#[async_trait]
pub trait SyncSettingsStore: Send + Sync {
    fn get(&self) -> Result<SyncSettings>;

    /// Advance the watermark after a completed run. Never moves it backward.
    async fn advance_watermark(&self, last_sync_at: DateTime<Utc>) -> Result<()>;
}

/// Append-only run log persistence.
#[async_trait]
pub trait SyncLogStore: Send + Sync {
    /// Insert the placeholder row (status partial) before any entity work.
    async fn insert_started(&self, log: NewSyncLog) -> Result<()>;

    async fn finalize(
        &self,
        log_id: String,
        status: SyncStatus,
        records_synced: i32,
        records_failed: i32,
        error_details: Option<serde_json::Value>,
        completed_at: DateTime<Utc>,
    ) -> Result<()>;
}

/// Destination tables, upsert-keyed on `(zenith_id, user_id)`.
#[async_trait]
pub trait ReplicaStore: Send + Sync {
    async fn upsert_category(&self, row: CategoryImport) -> Result<UpsertOutcome>;
    async fn upsert_payment_method(&self, row: PaymentMethodImport) -> Result<UpsertOutcome>;
    async fn upsert_transaction(&self, row: TransactionImport) -> Result<UpsertOutcome>;
    async fn upsert_reminder(&self, row: ReminderImport) -> Result<UpsertOutcome>;

    /// Local category id for a remote reference, if replicated.
    fn resolve_category_id(&self, zenith_id: &str, user_id: &str) -> Result<Option<String>>;

    /// Local payment method id for a remote reference, if replicated.
    fn resolve_payment_method_id(&self, zenith_id: &str, user_id: &str) -> Result<Option<String>>;
}
