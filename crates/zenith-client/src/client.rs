//! HTTP client for the Zenith personal-finance REST API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use moneta_core::sync::{
    SyncEntity, ZenithCategory, ZenithPaymentMethod, ZenithReminder, ZenithSource,
    ZenithTransaction,
};

use crate::error::{Result, ZenithClientError};
use crate::types::ApiErrorResponse;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Client for a Zenith instance's REST endpoints.
///
/// Reads are paged and filtered server-side by creation time: rows created
/// at-or-after `since`, ordered by `created_at` ascending. Failed requests are
/// not retried here; the sync run records the failure and the next run covers
/// the same window again.
#[derive(Debug, Clone)]
pub struct ZenithClient {
    client: reqwest::Client,
    base_url: String,
    service_token: String,
}

impl ZenithClient {
    /// Create a new client for a Zenith instance.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the instance (e.g., "https://zenith.example.com")
    /// * `service_token` - Machine-to-machine bearer token
    pub fn new(base_url: &str, service_token: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ZenithClientError::invalid_request("Zenith base URL is empty"));
        }
        if service_token.trim().is_empty() {
            return Err(ZenithClientError::auth("Zenith service token is empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url,
            service_token: service_token.trim().to_string(),
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.service_token))
            .map_err(|_| ZenithClientError::auth("Invalid service token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn page_url(&self, entity: SyncEntity, since: DateTime<Utc>, limit: i64, offset: i64) -> String {
        format!(
            "{}/rest/v1/{}?since={}&limit={}&offset={}&order=createdAt.asc",
            self.base_url,
            entity.table_name(),
            urlencoding::encode(&since.to_rfc3339()),
            limit,
            offset
        )
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("[ZenithClient] response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("[ZenithClient] response error ({}): {}", status, preview);
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(ZenithClientError::api(
                    status.as_u16(),
                    format!("{}: {}", error.code, error.message),
                ));
            }
            return Err(ZenithClientError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!(
                "[ZenithClient] failed to deserialize response. Body: {}, Error: {}",
                body,
                e
            );
            ZenithClientError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    async fn fetch_page<T: serde::de::DeserializeOwned>(
        &self,
        entity: SyncEntity,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<T>> {
        let url = self.page_url(entity, since, limit, offset);
        debug!(
            "[ZenithClient] GET {} (offset {})",
            entity.table_name(),
            offset
        );

        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await?;
        Self::parse_response(response).await
    }
}

#[async_trait]
impl ZenithSource for ZenithClient {
    async fn fetch_categories(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> moneta_core::Result<Vec<ZenithCategory>> {
        Ok(self
            .fetch_page(SyncEntity::Category, since, limit, offset)
            .await?)
    }

    async fn fetch_payment_methods(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> moneta_core::Result<Vec<ZenithPaymentMethod>> {
        Ok(self
            .fetch_page(SyncEntity::PaymentMethod, since, limit, offset)
            .await?)
    }

    async fn fetch_transactions(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> moneta_core::Result<Vec<ZenithTransaction>> {
        Ok(self
            .fetch_page(SyncEntity::Transaction, since, limit, offset)
            .await?)
    }

    async fn fetch_reminders(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> moneta_core::Result<Vec<ZenithReminder>> {
        Ok(self
            .fetch_page(SyncEntity::Reminder, since, limit, offset)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_trims_the_base_url() {
        let client = ZenithClient::new("https://zenith.example.com/", "token").expect("client");
        assert_eq!(client.base_url, "https://zenith.example.com");
    }

    #[test]
    fn new_rejects_blank_configuration() {
        assert!(matches!(
            ZenithClient::new("   ", "token"),
            Err(ZenithClientError::InvalidRequest(_))
        ));
        assert!(matches!(
            ZenithClient::new("https://zenith.example.com", "  "),
            Err(ZenithClientError::Auth(_))
        ));
    }

    #[test]
    fn page_url_encodes_the_watermark() {
        let client = ZenithClient::new("https://zenith.example.com", "token").expect("client");
        let since = Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap();
        let url = client.page_url(SyncEntity::Transaction, since, 100, 200);
        assert_eq!(
            url,
            "https://zenith.example.com/rest/v1/transactions?since=2026-03-01T10%3A30%3A00%2B00%3A00&limit=100&offset=200&order=createdAt.asc"
        );
    }
}
