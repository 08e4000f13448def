//! Health check handler

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiResponse, error_codes};
use crate::error::CareError;

/// Health check response data
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_i64)]
    pub timestamp_ms: i64,
    /// Seconds since the gateway started
    pub uptime_secs: i64,
    /// Git commit the binary was built from
    #[schema(example = "a1b2c3d")]
    pub build: String,
}

/// Health check endpoint
///
/// Probes the record store with a cheap lookup.
///
/// - Healthy: 200 OK + {code: 0, data: {...}}
/// - Unhealthy: 503 Service Unavailable + {code: 5001, msg: "..."}
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json"),
        (status = 503, description = "Record store unavailable")
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let now = Utc::now();

    match state.census.hospital(0) {
        Err(CareError::Store(e)) => {
            tracing::error!("[HEALTH] Record store probe failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    code: error_codes::SERVICE_UNAVAILABLE,
                    msg: format!("record store unavailable: {e}"),
                    data: None,
                }),
            )
        }
        // Id 0 is never allocated: NotFound means the store answered
        _ => (
            StatusCode::OK,
            Json(ApiResponse::success(HealthResponse {
                timestamp_ms: now.timestamp_millis(),
                uptime_secs: (now - state.started_at).num_seconds(),
                build: env!("GIT_HASH").to_string(),
            })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_health_check_ok() {
        let state = Arc::new(AppState::new(Arc::new(MemoryStore::new())));
        let (status, Json(body)) = health_check(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.code, 0);
        assert!(body.data.unwrap().uptime_secs >= 0);
    }
}
