//! Dashboard routes: the aggregated shop snapshot.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::services::dashboard::DashboardSnapshot;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Force a refresh instead of serving the latest snapshot.
    pub refresh: Option<bool>,
}

/// GET /api/v1/dashboard: latest snapshot, refreshing first if there is none.
pub async fn show(
    State(state): State<AppState>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Arc<DashboardSnapshot>>>, AppError> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let force = query.refresh.unwrap_or(false);
    let snapshot = run_detached(state, force).await?;
    Ok(ApiResponse::success(snapshot))
}

/// POST /api/v1/dashboard/refresh: run a refresh and return its snapshot.
pub async fn refresh(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Arc<DashboardSnapshot>>>, AppError> {
    let snapshot = run_detached(state, true).await?;
    Ok(ApiResponse::success(snapshot))
}

/// Run on a separate task so a dropped request does not abort a refresh halfway.
async fn run_detached(state: AppState, force: bool) -> Result<Arc<DashboardSnapshot>, AppError> {
    let dashboard = Arc::clone(&state.dashboard);
    tokio::spawn(async move {
        if force {
            dashboard.refresh().await
        } else {
            dashboard.latest_or_refresh().await
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("Dashboard refresh task failed: {e}")))
}
