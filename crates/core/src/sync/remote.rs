//! Remote record shapes and the source seam for the Zenith instance.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Category row as served by the Zenith REST endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZenithCategory {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: String,
}

/// Payment method row as served by the Zenith REST endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZenithPaymentMethod {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub method_type: Option<String>,
    pub created_at: String,
}

/// Transaction row as served by the Zenith REST endpoint.
///
/// `category_id` and `payment_method_id` are in the remote id-space and must
/// be remapped before the row is stored locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZenithTransaction {
    pub id: String,
    pub user_id: String,
    pub description: String,
    pub amount: Decimal,
    pub transaction_date: String,
    pub category_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Reminder row as served by the Zenith REST endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZenithReminder {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub due_date: String,
    pub amount: Option<Decimal>,
    pub is_paid: bool,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Read-only paged access to the Zenith instance.
///
/// Every method returns one page ordered by `created_at` ascending, filtered
/// to rows created at-or-after `since`.
#[async_trait]
pub trait ZenithSource: Send + Sync {
    async fn fetch_categories(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ZenithCategory>>;

    async fn fetch_payment_methods(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ZenithPaymentMethod>>;

    async fn fetch_transactions(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ZenithTransaction>>;

    async fn fetch_reminders(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ZenithReminder>>;
}
