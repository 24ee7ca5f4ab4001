//! API module
//!
//! HTTP plumbing shared by the music and user services.

pub mod extract;
pub mod middleware;

use axum::Json;
use serde::{Deserialize, Serialize};

pub use extract::{parse_uuid, MultipartForm, ValidatedJson};

/// `{ "success": true }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub is_active: bool,
}

/// Liveness endpoint, no auth
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { is_active: true })
}
