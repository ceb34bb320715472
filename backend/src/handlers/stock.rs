//! HTTP handlers for the movement log

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::stock::{MovementEntry, StockService};
use crate::AppState;
use shared::StockMovement;

/// List all stock movements, newest first
pub async fn list_movements(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<MovementEntry>>> {
    let service = StockService::new(state.db);
    let movements = service.list_movements().await?;
    Ok(Json(movements))
}

/// Get one stock movement
pub async fn get_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<StockMovement>> {
    let service = StockService::new(state.db);
    let movement = service.get_movement(movement_id).await?;
    Ok(Json(movement))
}
