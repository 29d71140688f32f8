//! Zenith sync endpoints: trigger, status, run history and settings.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use moneta_core::sync::{SyncLog, SyncRunResult, SyncSettingsStore, SyncTrigger};
use moneta_storage_sqlite::sync::SyncSettingsUpdate;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_LOG_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TriggerRequest {
    triggered_by: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncStatusResponse {
    enabled: bool,
    auto_sync: bool,
    sync_interval_minutes: i32,
    last_sync_at: Option<DateTime<Utc>>,
    zenith_url: Option<String>,
    running: bool,
    last_run: Option<SyncLog>,
}

fn parse_trigger(raw: Option<&str>) -> SyncTrigger {
    match raw {
        Some("cron") => SyncTrigger::Cron,
        Some("manual") | None => SyncTrigger::Manual,
        Some(_) => SyncTrigger::Unknown,
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Bearer check against the configured admin token. A missing configured
/// token leaves the API open (local development).
fn authorize(admin_token: Option<&str>, headers: &HeaderMap) -> ApiResult<()> {
    let Some(expected) = admin_token else {
        return Ok(());
    };
    match bearer_token(headers) {
        Some(token) if token == expected => Ok(()),
        Some(_) => Err(ApiError::Unauthorized("Invalid bearer token".to_string())),
        None => Err(ApiError::Unauthorized(
            "Missing bearer token".to_string(),
        )),
    }
}

/// Auth gate for the sync trigger. Cron-triggered calls bypass the bearer
/// check entirely; the scheduler runs in-process.
fn authorize_trigger(
    admin_token: Option<&str>,
    trigger: SyncTrigger,
    headers: &HeaderMap,
) -> ApiResult<()> {
    if trigger == SyncTrigger::Cron {
        return Ok(());
    }
    authorize(admin_token, headers)
}

async fn trigger_sync(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<TriggerRequest>>,
) -> ApiResult<Json<SyncRunResult>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let trigger = parse_trigger(request.triggered_by.as_deref());
    authorize_trigger(state.config.admin_token.as_deref(), trigger, &headers)?;

    let Ok(_guard) = state.run_lock.try_lock() else {
        return Err(ApiError::Conflict("A sync run is already in progress".to_string()));
    };

    info!("Sync run requested (trigger={:?})", trigger);
    let result = state.run_sync(trigger).await?;
    Ok(Json(result))
}

async fn get_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<SyncStatusResponse>> {
    authorize(state.config.admin_token.as_deref(), &headers)?;

    let settings = state.settings.get()?;
    let last_run = state.logs.get_latest()?;
    let running = state.run_lock.try_lock().is_err();

    Ok(Json(SyncStatusResponse {
        enabled: settings.enabled,
        auto_sync: settings.auto_sync,
        sync_interval_minutes: settings.sync_interval_minutes,
        last_sync_at: settings.last_sync_at,
        zenith_url: settings.zenith_url,
        running,
        last_run,
    }))
}

async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<SyncLog>>> {
    authorize(state.config.admin_token.as_deref(), &headers)?;
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    if limit < 1 {
        return Err(ApiError::BadRequest("limit must be positive".to_string()));
    }
    Ok(Json(state.logs.list_recent(limit)?))
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(update): Json<SyncSettingsUpdate>,
) -> ApiResult<Json<moneta_core::sync::SyncSettings>> {
    authorize(state.config.admin_token.as_deref(), &headers)?;
    if let Some(interval) = update.sync_interval_minutes {
        if interval < 1 {
            return Err(ApiError::BadRequest(
                "syncIntervalMinutes must be at least 1".to_string(),
            ));
        }
    }
    let settings = state.settings.update_settings(update).await?;
    Ok(Json(settings))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sync", post(trigger_sync))
        .route("/sync/status", get(get_status))
        .route("/sync/logs", get(list_logs))
        .route("/sync/settings", put(update_settings))
}
