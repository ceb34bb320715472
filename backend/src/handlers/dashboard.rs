//! HTTP handler for the dashboard

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::dashboard::{DashboardService, DashboardSummary};
use crate::AppState;

/// Aggregate figures for the landing screen
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> AppResult<Json<DashboardSummary>> {
    let service = DashboardService::new(state.db);
    let summary = service.summary().await?;
    Ok(Json(summary))
}
