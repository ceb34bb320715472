//! HTTP handlers for containers and their stock

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::container::{ContainerService, CreateContainerInput, UpdateContainerInput};
use crate::services::stock::{ContainerStockEntry, SetStockInput, StockService};
use crate::AppState;
use shared::Container;

/// A container with its current contents
#[derive(Debug, Serialize)]
pub struct ContainerDetail {
    #[serde(flatten)]
    pub container: Container,
    pub stock: Vec<ContainerStockEntry>,
}

/// Create a container
pub async fn create_container(
    State(state): State<AppState>,
    Json(input): Json<CreateContainerInput>,
) -> AppResult<(StatusCode, Json<Container>)> {
    let service = ContainerService::new(state.db);
    let container = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(container)))
}

/// List containers
pub async fn list_containers(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Container>>> {
    let service = ContainerService::new(state.db);
    let containers = service.list().await?;
    Ok(Json(containers))
}

/// Get a container with its contents
pub async fn get_container(
    State(state): State<AppState>,
    Path(container_id): Path<Uuid>,
) -> AppResult<Json<ContainerDetail>> {
    let containers = ContainerService::new(state.db.clone());
    let stock = StockService::new(state.db);

    let container = containers.get(container_id).await?;
    let contents = stock.get_container_stock(container_id).await?;

    Ok(Json(ContainerDetail {
        container,
        stock: contents,
    }))
}

/// Update a container
pub async fn update_container(
    State(state): State<AppState>,
    Path(container_id): Path<Uuid>,
    Json(input): Json<UpdateContainerInput>,
) -> AppResult<Json<Container>> {
    let service = ContainerService::new(state.db);
    let container = service.update(container_id, input).await?;
    Ok(Json(container))
}

/// Soft delete a container
pub async fn delete_container(
    State(state): State<AppState>,
    Path(container_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = ContainerService::new(state.db);
    service.remove(container_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stock-count correction: set absolute quantities in a container
pub async fn set_container_stock(
    State(state): State<AppState>,
    Path(container_id): Path<Uuid>,
    Json(input): Json<SetStockInput>,
) -> AppResult<Json<Vec<ContainerStockEntry>>> {
    let service = StockService::new(state.db);
    service.set_all(container_id, input).await?;
    let stock = service.get_container_stock(container_id).await?;
    Ok(Json(stock))
}

/// Movement log for a container
pub async fn get_container_movements(
    State(state): State<AppState>,
    Path(container_id): Path<Uuid>,
) -> AppResult<Json<Vec<crate::services::stock::MovementEntry>>> {
    let service = StockService::new(state.db);
    let movements = service.get_movements_for_container(container_id).await?;
    Ok(Json(movements))
}
