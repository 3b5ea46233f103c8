//! Health check endpoints for liveness and readiness.

use axum::{extract::State, Json};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::errors::{ApiResponse, AppError};
use crate::services::shop_client::ShopDataSource;
use crate::AppState;

/// Readiness detail.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub shop_api: String,
    pub shop_api_url: String,
    pub demo_mode: bool,
    pub last_refresh: Option<DateTime<FixedOffset>>,
}

/// Liveness: always returns OK if the process is running.
pub async fn live() -> &'static str {
    "OK"
}

/// Readiness: checks that the shop backend answers.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HealthStatus>>, AppError> {
    let dashboard = &state.dashboard;
    if let Err(e) = dashboard.source().check_status().await {
        tracing::warn!(error = %e, "Shop API health check failed");
        return Err(e.into());
    }

    let last_refresh = dashboard.latest().await.map(|s| s.refreshed_at);
    Ok(ApiResponse::success(HealthStatus {
        status: "ok".to_string(),
        shop_api: "connected".to_string(),
        shop_api_url: state.config.shop_api_base_url.clone(),
        demo_mode: state.config.demo_mode,
        last_refresh,
    }))
}
