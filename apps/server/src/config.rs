//! Environment-driven server configuration.

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

fn env_trimmed(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding the SQLite database file.
    pub data_dir: String,
    pub bind_addr: String,
    /// Bearer token protecting the API. `None` leaves the API open, which is
    /// only sensible for local development.
    pub admin_token: Option<String>,
    /// Fallback Zenith base URL when the settings row carries none.
    pub zenith_api_url: Option<String>,
    pub zenith_service_token: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: env_trimmed("MONETA_DB_PATH").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            bind_addr: env_trimmed("MONETA_BIND_ADDR")
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            admin_token: env_trimmed("MONETA_ADMIN_TOKEN"),
            zenith_api_url: env_trimmed("ZENITH_API_URL")
                .map(|v| v.trim_end_matches('/').to_string()),
            zenith_service_token: env_trimmed("ZENITH_SERVICE_TOKEN"),
        }
    }
}
