//! Orchestrator tests against in-memory stores and a scripted remote source.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;

use super::*;
use crate::errors::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Test doubles
// ─────────────────────────────────────────────────────────────────────────────

struct MemorySettings {
    inner: Mutex<SyncSettings>,
}

impl MemorySettings {
    fn new(last_sync_at: Option<DateTime<Utc>>) -> Self {
        Self {
            inner: Mutex::new(SyncSettings {
                enabled: true,
                auto_sync: false,
                sync_interval_minutes: 30,
                last_sync_at,
                zenith_url: Some("https://zenith.example".to_string()),
                updated_at: Utc::now(),
                updated_by: None,
            }),
        }
    }

    fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().expect("settings lock").last_sync_at
    }
}

#[async_trait]
impl SyncSettingsStore for MemorySettings {
    fn get(&self) -> Result<SyncSettings> {
        Ok(self.inner.lock().expect("settings lock").clone())
    }

    async fn advance_watermark(&self, last_sync_at: DateTime<Utc>) -> Result<()> {
        let mut settings = self.inner.lock().expect("settings lock");
        settings.last_sync_at = Some(last_sync_at);
        settings.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct FinalizedLog {
    id: String,
    status: SyncStatus,
    records_synced: i32,
    records_failed: i32,
    error_details: Option<serde_json::Value>,
    completed_at: DateTime<Utc>,
}

#[derive(Default)]
struct MemoryLogs {
    started: Mutex<Vec<NewSyncLog>>,
    finalized: Mutex<Vec<FinalizedLog>>,
}

impl MemoryLogs {
    fn last_finalized(&self) -> Option<FinalizedLog> {
        self.finalized.lock().expect("logs lock").last().cloned()
    }
}

#[async_trait]
impl SyncLogStore for MemoryLogs {
    async fn insert_started(&self, log: NewSyncLog) -> Result<()> {
        self.started.lock().expect("logs lock").push(log);
        Ok(())
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
        self.finalized.lock().expect("logs lock").push(FinalizedLog {
            id: log_id,
            status,
            records_synced,
            records_failed,
            error_details,
            completed_at,
        });
        Ok(())
    }
}

/// Local row shape shared by all four in-memory tables.
#[derive(Debug, Clone)]
struct LocalRow {
    local_id: String,
    updated_at: String,
    category_id: Option<String>,
}

#[derive(Default)]
struct MemoryReplica {
    // Keyed by (zenith_id, user_id), the upsert idempotency key.
    categories: Mutex<HashMap<(String, String), LocalRow>>,
    payment_methods: Mutex<HashMap<(String, String), LocalRow>>,
    transactions: Mutex<HashMap<(String, String), LocalRow>>,
    reminders: Mutex<HashMap<(String, String), LocalRow>>,
    fail_zenith_ids: HashSet<String>,
    upsert_order: Mutex<Vec<SyncEntity>>,
}

impl MemoryReplica {
    fn with_failing_rows(ids: &[&str]) -> Self {
        Self {
            fail_zenith_ids: ids.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    fn upsert(
        &self,
        table: &Mutex<HashMap<(String, String), LocalRow>>,
        entity: SyncEntity,
        zenith_id: String,
        user_id: String,
        remote_created_at: String,
        category_id: Option<String>,
    ) -> Result<UpsertOutcome> {
        self.upsert_order.lock().expect("order lock").push(entity);
        if self.fail_zenith_ids.contains(&zenith_id) {
            return Err(Error::Database(crate::DatabaseError::QueryFailed(format!(
                "constraint violation on {zenith_id}"
            ))));
        }

        let mut rows = table.lock().expect("table lock");
        let key = (zenith_id.clone(), user_id);
        match rows.get_mut(&key) {
            Some(existing) => {
                if remote_wins(&remote_created_at, &existing.updated_at) {
                    existing.updated_at = remote_created_at;
                    existing.category_id = category_id;
                    Ok(UpsertOutcome::Updated)
                } else {
                    Ok(UpsertOutcome::Unchanged)
                }
            }
            None => {
                rows.insert(
                    key,
                    LocalRow {
                        local_id: format!("local-{zenith_id}"),
                        updated_at: remote_created_at,
                        category_id,
                    },
                );
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    fn transaction_row(&self, zenith_id: &str, user_id: &str) -> Option<LocalRow> {
        self.transactions
            .lock()
            .expect("table lock")
            .get(&(zenith_id.to_string(), user_id.to_string()))
            .cloned()
    }

    fn seed_category(&self, zenith_id: &str, user_id: &str, updated_at: &str) {
        self.categories.lock().expect("table lock").insert(
            (zenith_id.to_string(), user_id.to_string()),
            LocalRow {
                local_id: format!("local-{zenith_id}"),
                updated_at: updated_at.to_string(),
                category_id: None,
            },
        );
    }
}

#[async_trait]
impl ReplicaStore for MemoryReplica {
    async fn upsert_category(&self, row: CategoryImport) -> Result<UpsertOutcome> {
        self.upsert(
            &self.categories,
            SyncEntity::Category,
            row.zenith_id,
            row.user_id,
            row.remote_created_at,
            None,
        )
    }

    async fn upsert_payment_method(&self, row: PaymentMethodImport) -> Result<UpsertOutcome> {
        self.upsert(
            &self.payment_methods,
            SyncEntity::PaymentMethod,
            row.zenith_id,
            row.user_id,
            row.remote_created_at,
            None,
        )
    }

    async fn upsert_transaction(&self, row: TransactionImport) -> Result<UpsertOutcome> {
        self.upsert(
            &self.transactions,
            SyncEntity::Transaction,
            row.zenith_id,
            row.user_id,
            row.remote_created_at,
            row.category_id,
        )
    }

    async fn upsert_reminder(&self, row: ReminderImport) -> Result<UpsertOutcome> {
        self.upsert(
            &self.reminders,
            SyncEntity::Reminder,
            row.zenith_id,
            row.user_id,
            row.remote_created_at,
            None,
        )
    }

    fn resolve_category_id(&self, zenith_id: &str, user_id: &str) -> Result<Option<String>> {
        Ok(self
            .categories
            .lock()
            .expect("table lock")
            .get(&(zenith_id.to_string(), user_id.to_string()))
            .map(|row| row.local_id.clone()))
    }

    fn resolve_payment_method_id(&self, zenith_id: &str, user_id: &str) -> Result<Option<String>> {
        Ok(self
            .payment_methods
            .lock()
            .expect("table lock")
            .get(&(zenith_id.to_string(), user_id.to_string()))
            .map(|row| row.local_id.clone()))
    }
}

#[derive(Default)]
struct ScriptedSource {
    categories: Vec<ZenithCategory>,
    payment_methods: Vec<ZenithPaymentMethod>,
    transactions: Vec<ZenithTransaction>,
    reminders: Vec<ZenithReminder>,
    fail_entities: HashSet<SyncEntity>,
    fetch_order: Mutex<Vec<SyncEntity>>,
}

impl ScriptedSource {
    fn record_fetch(&self, entity: SyncEntity) -> Result<()> {
        self.fetch_order.lock().expect("order lock").push(entity);
        if self.fail_entities.contains(&entity) {
            return Err(Error::remote(format!(
                "zenith table {} unreachable",
                entity.table_name()
            )));
        }
        Ok(())
    }

    fn first_fetches(&self) -> Vec<SyncEntity> {
        let mut seen = Vec::new();
        for entity in self.fetch_order.lock().expect("order lock").iter() {
            if !seen.contains(entity) {
                seen.push(*entity);
            }
        }
        seen
    }
}

fn page<T: Clone>(rows: &[T], since: DateTime<Utc>, limit: i64, offset: i64, created_at: impl Fn(&T) -> String) -> Vec<T> {
    let mut filtered: Vec<T> = rows
        .iter()
        .filter(|row| {
            DateTime::parse_from_rfc3339(&created_at(row))
                .map(|dt| dt.with_timezone(&Utc) >= since)
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    let start = (offset as usize).min(filtered.len());
    let end = (start + limit as usize).min(filtered.len());
    filtered.drain(..start);
    filtered.truncate(end - start);
    filtered
}

#[async_trait]
impl ZenithSource for ScriptedSource {
    async fn fetch_categories(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ZenithCategory>> {
        self.record_fetch(SyncEntity::Category)?;
        Ok(page(&self.categories, since, limit, offset, |r| {
            r.created_at.clone()
        }))
    }

    async fn fetch_payment_methods(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ZenithPaymentMethod>> {
        self.record_fetch(SyncEntity::PaymentMethod)?;
        Ok(page(&self.payment_methods, since, limit, offset, |r| {
            r.created_at.clone()
        }))
    }

    async fn fetch_transactions(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ZenithTransaction>> {
        self.record_fetch(SyncEntity::Transaction)?;
        Ok(page(&self.transactions, since, limit, offset, |r| {
            r.created_at.clone()
        }))
    }

    async fn fetch_reminders(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ZenithReminder>> {
        self.record_fetch(SyncEntity::Reminder)?;
        Ok(page(&self.reminders, since, limit, offset, |r| {
            r.created_at.clone()
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

fn category(id: &str, user: &str, created_at: &str) -> ZenithCategory {
    ZenithCategory {
        id: id.to_string(),
        user_id: user.to_string(),
        name: format!("category {id}"),
        color: Some("#aabbcc".to_string()),
        icon: None,
        created_at: created_at.to_string(),
    }
}

fn transaction(
    id: &str,
    user: &str,
    category_id: Option<&str>,
    created_at: &str,
) -> ZenithTransaction {
    ZenithTransaction {
        id: id.to_string(),
        user_id: user.to_string(),
        description: format!("transaction {id}"),
        amount: dec!(12.50),
        transaction_date: "2026-04-01".to_string(),
        category_id: category_id.map(|s| s.to_string()),
        payment_method_id: None,
        notes: None,
        created_at: created_at.to_string(),
    }
}

struct Harness {
    settings: Arc<MemorySettings>,
    logs: Arc<MemoryLogs>,
    replica: Arc<MemoryReplica>,
    orchestrator: SyncOrchestrator,
}

fn harness_with(replica: MemoryReplica, last_sync_at: Option<DateTime<Utc>>) -> Harness {
    let settings = Arc::new(MemorySettings::new(last_sync_at));
    let logs = Arc::new(MemoryLogs::default());
    let replica = Arc::new(replica);
    let orchestrator = SyncOrchestrator::new(
        settings.clone(),
        logs.clone(),
        replica.clone(),
        SyncConfig::default(),
    );
    Harness {
        settings,
        logs,
        replica,
        orchestrator,
    }
}

fn harness() -> Harness {
    harness_with(MemoryReplica::default(), None)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_run_inserts_everything_and_second_run_is_a_noop() {
    let h = harness();
    let source = ScriptedSource {
        categories: vec![
            category("zc-1", "user-1", "2026-04-01T10:00:00Z"),
            category("zc-2", "user-1", "2026-04-01T11:00:00Z"),
        ],
        ..ScriptedSource::default()
    };

    let first = h
        .orchestrator
        .run(Some(&source), SyncTrigger::Manual)
        .await
        .expect("first run");
    assert_eq!(first.synced.categories, 2);
    assert_eq!(first.status, SyncStatus::Success);

    let second = h
        .orchestrator
        .run(Some(&source), SyncTrigger::Manual)
        .await
        .expect("second run");
    assert_eq!(second.synced, SyncedCounts::default());
    assert_eq!(second.status, SyncStatus::Success);
}

#[tokio::test]
async fn existing_local_row_updates_only_when_remote_is_strictly_newer() {
    let replica = MemoryReplica::default();
    replica.seed_category("zc-newer", "user-1", "2026-04-02T00:00:00Z");
    replica.seed_category("zc-older", "user-1", "2026-03-01T00:00:00Z");
    let h = harness_with(replica, None);

    let source = ScriptedSource {
        categories: vec![
            // Local copy is newer: must be left alone and not counted.
            category("zc-newer", "user-1", "2026-04-01T00:00:00Z"),
            // Local copy is older: must be updated and counted.
            category("zc-older", "user-1", "2026-04-01T00:00:00Z"),
        ],
        ..ScriptedSource::default()
    };

    let result = h
        .orchestrator
        .run(Some(&source), SyncTrigger::Manual)
        .await
        .expect("run");
    assert_eq!(result.synced.categories, 1);

    let untouched = h
        .replica
        .categories
        .lock()
        .expect("table lock")
        .get(&("zc-newer".to_string(), "user-1".to_string()))
        .cloned()
        .expect("seeded row");
    assert_eq!(untouched.updated_at, "2026-04-02T00:00:00Z");
}

#[tokio::test]
async fn transaction_category_remap_follows_the_spec_scenario() {
    // 3 new categories, 2 new transactions: one references a replicated
    // category, one references a category that does not exist remotely.
    let h = harness();
    let source = ScriptedSource {
        categories: vec![
            category("zc-1", "user-1", "2026-04-01T10:00:00Z"),
            category("zc-2", "user-1", "2026-04-01T10:01:00Z"),
            category("zc-3", "user-1", "2026-04-01T10:02:00Z"),
        ],
        transactions: vec![
            transaction("zt-1", "user-1", Some("zc-2"), "2026-04-01T12:00:00Z"),
            transaction("zt-2", "user-1", Some("zc-missing"), "2026-04-01T12:01:00Z"),
        ],
        ..ScriptedSource::default()
    };

    let result = h
        .orchestrator
        .run(Some(&source), SyncTrigger::Manual)
        .await
        .expect("run");

    assert_eq!(result.synced.categories, 3);
    assert_eq!(result.synced.transactions, 2);
    assert_eq!(result.status, SyncStatus::Success);

    let resolved = h.replica.transaction_row("zt-1", "user-1").expect("row");
    assert_eq!(resolved.category_id.as_deref(), Some("local-zc-2"));

    let unresolved = h.replica.transaction_row("zt-2", "user-1").expect("row");
    assert_eq!(unresolved.category_id, None);
}

#[tokio::test]
async fn entities_replicate_in_dependency_order() {
    let h = harness();
    let source = ScriptedSource {
        categories: vec![category("zc-1", "user-1", "2026-04-01T10:00:00Z")],
        transactions: vec![transaction("zt-1", "user-1", None, "2026-04-01T12:00:00Z")],
        ..ScriptedSource::default()
    };

    h.orchestrator
        .run(Some(&source), SyncTrigger::Manual)
        .await
        .expect("run");

    assert_eq!(source.first_fetches(), SYNC_ENTITY_ORDER.to_vec());
}

#[tokio::test]
async fn one_failing_entity_does_not_block_its_siblings() {
    let h = harness();
    let source = ScriptedSource {
        categories: vec![category("zc-1", "user-1", "2026-04-01T10:00:00Z")],
        fail_entities: [SyncEntity::Transaction].into_iter().collect(),
        ..ScriptedSource::default()
    };

    let result = h
        .orchestrator
        .run(Some(&source), SyncTrigger::Manual)
        .await
        .expect("run completes despite entity failure");

    assert!(!result.success);
    assert_eq!(result.status, SyncStatus::Partial);
    assert_eq!(result.synced.categories, 1);
    assert_eq!(result.synced.reminders, 0);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("transactions:"));

    // Reminders still ran after the transaction failure.
    assert!(source.first_fetches().contains(&SyncEntity::Reminder));
}

#[tokio::test]
async fn all_entities_failing_with_no_progress_is_a_failed_run() {
    let h = harness();
    let source = ScriptedSource {
        fail_entities: SYNC_ENTITY_ORDER.into_iter().collect(),
        ..ScriptedSource::default()
    };

    let result = h
        .orchestrator
        .run(Some(&source), SyncTrigger::Cron)
        .await
        .expect("run completes");

    assert_eq!(result.status, SyncStatus::Failed);
    assert_eq!(result.errors.len(), 4);
    assert_eq!(result.synced.total(), 0);

    let log = h.logs.last_finalized().expect("finalized log");
    assert_eq!(log.status, SyncStatus::Failed);
    assert_eq!(log.records_synced, 0);
}

#[tokio::test]
async fn row_failures_are_surfaced_without_failing_the_run() {
    let h = harness_with(MemoryReplica::with_failing_rows(&["zc-bad"]), None);
    let source = ScriptedSource {
        categories: vec![
            category("zc-ok", "user-1", "2026-04-01T10:00:00Z"),
            category("zc-bad", "user-1", "2026-04-01T10:01:00Z"),
        ],
        ..ScriptedSource::default()
    };

    let result = h
        .orchestrator
        .run(Some(&source), SyncTrigger::Manual)
        .await
        .expect("run");

    assert!(result.success);
    assert_eq!(result.status, SyncStatus::Success);
    assert_eq!(result.synced.categories, 1);
    assert_eq!(result.row_errors.len(), 1);
    assert_eq!(result.row_errors[0].zenith_id, "zc-bad");

    let log = h.logs.last_finalized().expect("finalized log");
    assert_eq!(log.records_failed, 1);
    assert!(log.error_details.is_some());
}

#[tokio::test]
async fn watermark_advances_on_any_completed_run_and_never_backward() {
    let before = Utc::now();
    let h = harness();
    let source = ScriptedSource {
        fail_entities: [SyncEntity::Category].into_iter().collect(),
        ..ScriptedSource::default()
    };

    h.orchestrator
        .run(Some(&source), SyncTrigger::Manual)
        .await
        .expect("run");

    let after = h.settings.last_sync_at().expect("watermark set");
    assert!(after >= before);

    // A second run must not move it backward.
    h.orchestrator
        .run(Some(&source), SyncTrigger::Manual)
        .await
        .expect("second run");
    assert!(h.settings.last_sync_at().expect("watermark") >= after);
}

#[tokio::test]
async fn missing_remote_configuration_fails_the_run_with_a_failed_log() {
    let h = harness();

    let err = h
        .orchestrator
        .run(None, SyncTrigger::Manual)
        .await
        .expect_err("configuration error");
    assert!(matches!(err, Error::Configuration(_)));

    let log = h.logs.last_finalized().expect("finalized log");
    assert_eq!(log.status, SyncStatus::Failed);
    assert_eq!(log.records_synced, 0);
    assert!(log.error_details.is_some());
    assert!(h.settings.last_sync_at().is_none());
}

#[tokio::test]
async fn log_rows_start_partial_and_finish_consistent() {
    let h = harness();
    let source = ScriptedSource {
        categories: vec![category("zc-1", "user-1", "2026-04-01T10:00:00Z")],
        ..ScriptedSource::default()
    };

    h.orchestrator
        .run(Some(&source), SyncTrigger::Cron)
        .await
        .expect("run");

    let started = h.logs.started.lock().expect("logs lock");
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].sync_type, ZENITH_SYNC_TYPE);
    assert_eq!(started[0].triggered_by, SyncTrigger::Cron);

    let log = h.logs.last_finalized().expect("finalized log");
    assert_eq!(log.id, started[0].id);
    assert_eq!(log.status, SyncStatus::Success);
    assert_eq!(log.records_synced, 1);
    assert!(log.completed_at >= started[0].started_at);
    assert!(log.error_details.is_none());
}

#[tokio::test]
async fn pagination_walks_every_page_of_a_large_table() {
    let h = harness();
    let categories = (0..250)
        .map(|n| {
            category(
                &format!("zc-{n:03}"),
                "user-1",
                &format!("2026-04-01T10:{:02}:{:02}Z", n / 60, n % 60),
            )
        })
        .collect();
    let source = ScriptedSource {
        categories,
        ..ScriptedSource::default()
    };

    let result = h
        .orchestrator
        .run(Some(&source), SyncTrigger::Manual)
        .await
        .expect("run");

    assert_eq!(result.synced.categories, 250);
    // 100 + 100 + 50: the short third page terminates the loop.
    let fetches = source
        .fetch_order
        .lock()
        .expect("order lock")
        .iter()
        .filter(|e| **e == SyncEntity::Category)
        .count();
    assert_eq!(fetches, 3);
}
