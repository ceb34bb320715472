//! HTTP handlers for the product catalog

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::product::{
    CreateProductInput, ProductFilter, ProductListEntry, ProductService, UpdateProductInput,
};
use crate::services::stock::{MovementEntry, ProductStockEntry, StockService};
use crate::AppState;
use shared::Product;

/// A product with where it is stored and what happened to it
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub total_quantity: i64,
    pub containers: Vec<ProductStockEntry>,
    pub movements: Vec<MovementEntry>,
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let service = ProductService::new(state.db);
    let product = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Create several products at once
pub async fn create_products_bulk(
    State(state): State<AppState>,
    Json(inputs): Json<Vec<CreateProductInput>>,
) -> AppResult<(StatusCode, Json<Vec<Product>>)> {
    let service = ProductService::new(state.db);
    let products = service.create_bulk(inputs).await?;
    Ok((StatusCode::CREATED, Json(products)))
}

/// List products with total quantities
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> AppResult<Json<Vec<ProductListEntry>>> {
    let service = ProductService::new(state.db);
    let products = service.list(filter).await?;
    Ok(Json(products))
}

/// Get a product with its containers and movement log
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductDetail>> {
    let products = ProductService::new(state.db.clone());
    let stock = StockService::new(state.db);

    let product = products.get(product_id).await?;
    let total = stock.get_product_total(product_id).await?;
    let containers = stock.get_product_stock(product_id).await?;
    let movements = stock.get_movements_for_product(product_id).await?;

    Ok(Json(ProductDetail {
        product,
        total_quantity: total.total_quantity,
        containers,
        movements,
    }))
}

/// Update a product
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service.update(product_id, input).await?;
    Ok(Json(product))
}

/// Soft delete a product
pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = ProductService::new(state.db);
    service.remove(product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
