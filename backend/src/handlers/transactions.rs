//! HTTP handlers for sale and purchase transactions

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::invoice::InvoiceService;
use crate::services::payment::{PaymentService, RecordPaymentInput};
use crate::services::transaction::{
    CreateTransactionInput, TransactionDetail, TransactionFilter, TransactionService,
    TransactionSummary,
};
use crate::AppState;
use shared::{
    PaginatedResponse, Pagination, PaymentStatus, Transaction, TransactionKind,
};

/// Query parameters for the transaction list
#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    pub kind: Option<TransactionKind>,
    pub payment_status: Option<PaymentStatus>,
    pub contact_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Create a sale transaction
pub async fn create_sale(
    State(state): State<AppState>,
    Json(input): Json<CreateTransactionInput>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    create_transaction(state, TransactionKind::Sale, input).await
}

/// Create a purchase transaction
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(input): Json<CreateTransactionInput>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    create_transaction(state, TransactionKind::Purchase, input).await
}

async fn create_transaction(
    state: AppState,
    kind: TransactionKind,
    input: CreateTransactionInput,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    let service = TransactionService::new(state.db.clone());
    let transaction = service.create(kind, input).await?;

    // Invoice generation runs after the ledger has committed; a failure
    // here is logged, never surfaced to the caller.
    let invoices = InvoiceService::new(state.db, state.config.clone());
    let transaction_id = transaction.id;
    tokio::spawn(async move {
        if let Err(e) = invoices.generate(transaction_id, false).await {
            tracing::error!(%transaction_id, error = ?e, "Invoice generation failed");
        }
    });

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// List transactions with filters and pagination
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> AppResult<Json<PaginatedResponse<TransactionSummary>>> {
    let defaults = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };
    let filter = TransactionFilter {
        kind: query.kind,
        payment_status: query.payment_status,
        contact_id: query.contact_id,
        date_from: query.date_from,
        date_to: query.date_to,
        search: query.search,
    };

    let service = TransactionService::new(state.db);
    let page = service.list(filter, pagination).await?;
    Ok(Json(page))
}

/// Get a transaction with its lines and payments
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<TransactionDetail>> {
    let service = TransactionService::new(state.db);
    let detail = service.get(transaction_id).await?;
    Ok(Json(detail))
}

/// Reverse and soft-delete a transaction
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = TransactionService::new(state.db);
    service.delete(transaction_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a payment against a transaction
pub async fn record_payment(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
    Json(input): Json<RecordPaymentInput>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    let service = PaymentService::new(state.db);
    let transaction = service.record_payment(transaction_id, input).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Regenerate the invoice document for a transaction
pub async fn regenerate_invoice(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let service = InvoiceService::new(state.db, state.config.clone());
    let url = service.generate(transaction_id, true).await?;
    Ok(Json(serde_json::json!({ "invoice_url": url })))
}
