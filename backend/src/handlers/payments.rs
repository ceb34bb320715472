//! HTTP handlers for manual payments and the payment summary

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::payment::{
    CreateManualPaymentInput, PaymentFilter, PaymentService, PaymentSummary, UpdatePaymentInput,
};
use crate::AppState;
use shared::{Payment, SUGGESTED_PAYMENT_CATEGORIES};

/// Date range for the payment summary
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Create a freestanding manual payment
pub async fn create_payment(
    State(state): State<AppState>,
    Json(input): Json<CreateManualPaymentInput>,
) -> AppResult<(StatusCode, Json<Payment>)> {
    let service = PaymentService::new(state.db);
    let payment = service.create_manual(input).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// List payments with filters
pub async fn list_payments(
    State(state): State<AppState>,
    Query(filter): Query<PaymentFilter>,
) -> AppResult<Json<Vec<Payment>>> {
    let service = PaymentService::new(state.db);
    let payments = service.list(filter).await?;
    Ok(Json(payments))
}

/// Manual-payment totals over a date range
pub async fn payment_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> AppResult<Json<PaymentSummary>> {
    let service = PaymentService::new(state.db);
    let summary = service.summary(query.date_from, query.date_to).await?;
    Ok(Json(summary))
}

/// Suggested categories for manual payments
pub async fn payment_categories() -> Json<Vec<&'static str>> {
    Json(SUGGESTED_PAYMENT_CATEGORIES.to_vec())
}

/// Get a payment
pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<Payment>> {
    let service = PaymentService::new(state.db);
    let payment = service.get(payment_id).await?;
    Ok(Json(payment))
}

/// Update a payment
pub async fn update_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
    Json(input): Json<UpdatePaymentInput>,
) -> AppResult<Json<Payment>> {
    let service = PaymentService::new(state.db);
    let payment = service.update(payment_id, input).await?;
    Ok(Json(payment))
}

/// Soft delete a payment
pub async fn delete_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = PaymentService::new(state.db);
    service.remove(payment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
