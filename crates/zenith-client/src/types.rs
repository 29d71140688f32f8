//! Wire types specific to the Zenith REST API.
//!
//! The replicated record payloads themselves live in `moneta_core::sync`.

use serde::Deserialize;

/// Error envelope returned by the Zenith REST API.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub code: String,
    pub message: String,
}
