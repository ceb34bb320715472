//! Route definitions for the TradeBook backend

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/containers", container_routes())
        .nest("/contacts", contact_routes())
        .nest("/transactions", transaction_routes())
        .nest("/payments", payment_routes())
        .nest("/stock", stock_routes())
        .route("/dashboard", get(handlers::get_dashboard))
}

/// Product catalog routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/bulk", post(handlers::create_products_bulk))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
}

/// Container and container-stock routes
fn container_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_containers).post(handlers::create_container),
        )
        .route(
            "/:container_id",
            get(handlers::get_container)
                .put(handlers::update_container)
                .delete(handlers::delete_container),
        )
        .route(
            "/:container_id/stock",
            axum::routing::put(handlers::set_container_stock),
        )
        .route(
            "/:container_id/movements",
            get(handlers::get_container_movements),
        )
}

/// Contact routes
fn contact_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_contacts).post(handlers::create_contact),
        )
        .route(
            "/:contact_id",
            get(handlers::get_contact)
                .put(handlers::update_contact)
                .delete(handlers::delete_contact),
        )
}

/// Transaction routes
fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_transactions))
        .route("/sales", post(handlers::create_sale))
        .route("/purchases", post(handlers::create_purchase))
        .route(
            "/:transaction_id",
            get(handlers::get_transaction).delete(handlers::delete_transaction),
        )
        .route("/:transaction_id/payments", post(handlers::record_payment))
        .route(
            "/:transaction_id/invoice",
            post(handlers::regenerate_invoice),
        )
}

/// Manual payment routes
fn payment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_payments).post(handlers::create_payment),
        )
        .route("/summary", get(handlers::payment_summary))
        .route("/categories", get(handlers::payment_categories))
        .route(
            "/:payment_id",
            get(handlers::get_payment)
                .put(handlers::update_payment)
                .delete(handlers::delete_payment),
        )
}

/// Movement log routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/movements", get(handlers::list_movements))
        .route("/movements/:movement_id", get(handlers::get_movement))
}
