//! Transactions service
//!
//! Builds sale and purchase transactions atomically: counterparty and
//! product validation, totals, stock ledger adjustments, balance
//! effect, and the optional initial payment all commit as one
//! unit-of-work. Deletion is the exact algebraic inverse.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{contact, product, stock};
use shared::{
    balance_effect_on_create, compute_totals, stock_delta_on_create, LineAmounts, PaginatedResponse,
    Pagination, PaymentKind, PaymentMethod, PaymentStatus, StockAction, Transaction,
    TransactionKind, TransactionLine,
};

/// Transactions service
#[derive(Clone)]
pub struct TransactionService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
pub(crate) struct TransactionRow {
    pub id: Uuid,
    pub transaction_number: String,
    pub transaction_date: NaiveDate,
    pub kind: String,
    pub contact_id: Uuid,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub payment_status: String,
    pub notes: Option<String>,
    pub invoice_url: Option<String>,
    pub invoice_checksum: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = AppError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            id: row.id,
            transaction_number: row.transaction_number,
            transaction_date: row.transaction_date,
            kind: TransactionKind::from_str(&row.kind).map_err(AppError::Internal)?,
            contact_id: row.contact_id,
            subtotal: row.subtotal,
            tax_amount: row.tax_amount,
            discount_amount: row.discount_amount,
            total_amount: row.total_amount,
            paid_amount: row.paid_amount,
            payment_status: PaymentStatus::from_str(&row.payment_status)
                .map_err(AppError::Internal)?,
            notes: row.notes,
            invoice_url: row.invoice_url,
            invoice_checksum: row.invoice_checksum,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct TransactionLineRow {
    id: Uuid,
    transaction_id: Uuid,
    product_id: Uuid,
    container_id: Option<Uuid>,
    quantity: i32,
    unit_price: Decimal,
    line_total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<TransactionLineRow> for TransactionLine {
    fn from(row: TransactionLineRow) -> Self {
        TransactionLine {
            id: row.id,
            transaction_id: row.transaction_id,
            product_id: row.product_id,
            container_id: row.container_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            line_total: row.line_total,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, transaction_number, transaction_date, kind, contact_id, subtotal, tax_amount, \
     discount_amount, total_amount, paid_amount, payment_status, notes, invoice_url, \
     invoice_checksum, created_at, updated_at, deleted_at";

const LINE_COLUMNS: &str = "id, transaction_id, product_id, container_id, quantity, unit_price, \
                            line_total, created_at, updated_at, deleted_at";

/// Database sequence backing number allocation for a kind
fn sequence_name(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Sale => "sale_number_seq",
        TransactionKind::Purchase => "purchase_number_seq",
    }
}

/// One product line in a transaction create request
#[derive(Debug, Deserialize)]
pub struct TransactionLineInput {
    pub product_id: Uuid,
    pub container_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Input for creating a sale or purchase
#[derive(Debug, Deserialize)]
pub struct CreateTransactionInput {
    pub contact_id: Uuid,
    pub transaction_date: NaiveDate,
    pub lines: Vec<TransactionLineInput>,
    #[serde(default)]
    pub tax_amount: Decimal,
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub paid_amount: Decimal,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

/// Filters for listing transactions
#[derive(Debug, Default, Deserialize)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub payment_status: Option<PaymentStatus>,
    pub contact_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
}

/// A transaction with its lines and payments
#[derive(Debug, Serialize)]
pub struct TransactionDetail {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub lines: Vec<TransactionLine>,
    pub payments: Vec<shared::Payment>,
}

/// A transaction header joined with its counterparty name for listings
#[derive(Debug, Serialize, FromRow)]
pub struct TransactionSummary {
    pub id: Uuid,
    pub transaction_number: String,
    pub transaction_date: NaiveDate,
    pub kind: String,
    pub contact_id: Uuid,
    pub contact_name: String,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

impl TransactionService {
    /// Create a new TransactionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Build a sale or purchase transaction in one unit-of-work.
    ///
    /// Validates the counterparty and every product, checks locked
    /// stock sufficiency for sales, computes totals, allocates the
    /// transaction number from the per-kind sequence, writes the
    /// header, lines, ledger adjustments, balance effect, and the
    /// optional initial payment, then commits once.
    pub async fn create(
        &self,
        kind: TransactionKind,
        input: CreateTransactionInput,
    ) -> AppResult<Transaction> {
        Self::validate_input(&input)?;

        let mut tx = self.db.begin().await?;

        let contact = match kind {
            TransactionKind::Sale => {
                contact::ContactService::validate_for_sale(&mut *tx, input.contact_id).await?
            }
            TransactionKind::Purchase => {
                contact::ContactService::validate_for_purchase(&mut *tx, input.contact_id).await?
            }
        };

        let product_ids: Vec<Uuid> = input.lines.iter().map(|l| l.product_id).collect();
        product::validate_products_exist(&mut *tx, &product_ids).await?;

        // Sales pull from existing positions: lock each one and check
        // sufficiency before any write, naming the product and shortfall.
        if kind == TransactionKind::Sale {
            for line in &input.lines {
                let container_id = line
                    .container_id
                    .ok_or_else(|| Self::missing_container(line.product_id))?;

                let available = sqlx::query_scalar::<_, i32>(
                    r#"
                    SELECT quantity FROM stock_positions
                    WHERE container_id = $1 AND product_id = $2 AND deleted_at IS NULL
                    FOR UPDATE
                    "#,
                )
                .bind(container_id)
                .bind(line.product_id)
                .fetch_optional(&mut *tx)
                .await?
                .unwrap_or(0);

                if available < line.quantity {
                    let name = Self::product_name(&mut *tx, line.product_id).await?;
                    return Err(AppError::InsufficientStock(format!(
                        "Insufficient stock for '{}': available {}, requested {} (short {})",
                        name,
                        available,
                        line.quantity,
                        line.quantity - available
                    )));
                }
            }
        }

        let amounts: Vec<LineAmounts> = input
            .lines
            .iter()
            .map(|l| LineAmounts {
                quantity: l.quantity,
                unit_price: l.unit_price,
            })
            .collect();
        let (subtotal, total_amount) =
            compute_totals(&amounts, input.tax_amount, input.discount_amount);

        if input.paid_amount > total_amount {
            return Err(AppError::Validation(format!(
                "Paid amount {} exceeds total {}",
                input.paid_amount, total_amount
            )));
        }

        let payment_status = PaymentStatus::from_amounts(input.paid_amount, total_amount);

        let sequence: i64 = sqlx::query_scalar("SELECT nextval($1::regclass)")
            .bind(sequence_name(kind))
            .fetch_one(&mut *tx)
            .await?;
        let transaction_number = kind.format_number(sequence);

        let header = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            INSERT INTO transactions
                (transaction_number, transaction_date, kind, contact_id, subtotal,
                 tax_amount, discount_amount, total_amount, paid_amount, payment_status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {TRANSACTION_COLUMNS}
            "#,
        ))
        .bind(&transaction_number)
        .bind(input.transaction_date)
        .bind(kind.as_str())
        .bind(contact.id)
        .bind(subtotal)
        .bind(input.tax_amount)
        .bind(input.discount_amount)
        .bind(total_amount)
        .bind(input.paid_amount)
        .bind(payment_status.as_str())
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        let note_prefix = match kind {
            TransactionKind::Sale => format!("Sale {transaction_number}"),
            TransactionKind::Purchase => format!("Purchase {transaction_number}"),
        };
        let action = match kind {
            TransactionKind::Sale => StockAction::Sale,
            TransactionKind::Purchase => StockAction::Purchase,
        };

        for line in &input.lines {
            sqlx::query(
                r#"
                INSERT INTO transaction_lines
                    (transaction_id, product_id, container_id, quantity, unit_price, line_total)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(header.id)
            .bind(line.product_id)
            .bind(line.container_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.unit_price * Decimal::from(line.quantity))
            .execute(&mut *tx)
            .await?;

            let container_id = line
                .container_id
                .ok_or_else(|| Self::missing_container(line.product_id))?;

            stock::adjust(
                &mut *tx,
                container_id,
                line.product_id,
                stock_delta_on_create(kind, line.quantity),
                action,
                &note_prefix,
            )
            .await?;
        }

        let outstanding = total_amount - input.paid_amount;
        contact::adjust_balance(
            &mut *tx,
            contact.id,
            balance_effect_on_create(kind, outstanding),
        )
        .await?;

        if input.paid_amount > Decimal::ZERO {
            let method = input
                .payment_method
                .ok_or_else(|| {
                    AppError::Validation(
                        "Payment method is required when paid amount is greater than zero"
                            .to_string(),
                    )
                })?;

            sqlx::query(
                r#"
                INSERT INTO payments
                    (transaction_id, contact_id, payment_date, amount, kind, payment_method)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(header.id)
            .bind(contact.id)
            .bind(input.transaction_date)
            .bind(input.paid_amount)
            .bind(PaymentKind::for_transaction(kind).as_str())
            .bind(method.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            transaction_number = %transaction_number,
            kind = kind.as_str(),
            total = %total_amount,
            "Transaction created"
        );

        header.try_into()
    }

    /// Reverse and soft-delete a transaction.
    ///
    /// Applies the opposite-sign stock adjustment for every line,
    /// negates the balance effect on the outstanding amount, and
    /// soft-deletes the header, lines, and payments with one
    /// timestamp. A purchase reversal fails if the stock has since
    /// been sold elsewhere, rolling everything back.
    pub async fn delete(&self, transaction_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let header = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS} FROM transactions
            WHERE id = $1 AND deleted_at IS NULL
            FOR UPDATE
            "#,
        ))
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        let kind = TransactionKind::from_str(&header.kind).map_err(AppError::Internal)?;

        let lines = sqlx::query_as::<_, TransactionLineRow>(&format!(
            r#"
            SELECT {LINE_COLUMNS} FROM transaction_lines
            WHERE transaction_id = $1 AND deleted_at IS NULL
            "#,
        ))
        .bind(transaction_id)
        .fetch_all(&mut *tx)
        .await?;

        // Sale reversal returns stock (added); purchase reversal removes
        // it and may legitimately fail on insufficient stock.
        let reversal_action = match kind {
            TransactionKind::Sale => StockAction::Added,
            TransactionKind::Purchase => StockAction::Removed,
        };
        let note_prefix = format!("Reversal of {}", header.transaction_number);

        for line in &lines {
            if let Some(container_id) = line.container_id {
                stock::adjust(
                    &mut *tx,
                    container_id,
                    line.product_id,
                    -stock_delta_on_create(kind, line.quantity),
                    reversal_action,
                    &note_prefix,
                )
                .await?;
            }
        }

        let outstanding = header.total_amount - header.paid_amount;
        contact::adjust_balance(
            &mut *tx,
            header.contact_id,
            -balance_effect_on_create(kind, outstanding),
        )
        .await?;

        // One timestamp across header, lines, and payments
        let deleted_at = Utc::now();

        sqlx::query("UPDATE transactions SET deleted_at = $1, updated_at = $1 WHERE id = $2")
            .bind(deleted_at)
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE transaction_lines SET deleted_at = $1, updated_at = $1
            WHERE transaction_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(deleted_at)
        .bind(transaction_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE payments SET deleted_at = $1, updated_at = $1
            WHERE transaction_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(deleted_at)
        .bind(transaction_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            transaction_number = %header.transaction_number,
            "Transaction reversed and deleted"
        );

        Ok(())
    }

    /// Fetch one live transaction with its lines and payments
    pub async fn get(&self, transaction_id: Uuid) -> AppResult<TransactionDetail> {
        let header = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1 AND deleted_at IS NULL",
        ))
        .bind(transaction_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        let lines = sqlx::query_as::<_, TransactionLineRow>(&format!(
            r#"
            SELECT {LINE_COLUMNS} FROM transaction_lines
            WHERE transaction_id = $1 AND deleted_at IS NULL
            ORDER BY created_at ASC
            "#,
        ))
        .bind(transaction_id)
        .fetch_all(&self.db)
        .await?;

        let payments = crate::services::payment::fetch_for_transaction(&self.db, transaction_id)
            .await?;

        Ok(TransactionDetail {
            transaction: header.try_into()?,
            lines: lines.into_iter().map(TransactionLine::from).collect(),
            payments,
        })
    }

    /// List transaction summaries with filters and pagination
    pub async fn list(
        &self,
        filter: TransactionFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<TransactionSummary>> {
        let mut conditions = String::new();

        if filter.kind.is_some() {
            conditions.push_str(" AND t.kind = $1");
        } else {
            conditions.push_str(" AND $1 = ''");
        }
        if filter.payment_status.is_some() {
            conditions.push_str(" AND t.payment_status = $2");
        } else {
            conditions.push_str(" AND $2 = ''");
        }
        if filter.contact_id.is_some() {
            conditions.push_str(" AND t.contact_id = $3");
        } else {
            conditions.push_str(" AND $3::uuid IS NULL");
        }
        if filter.date_from.is_some() {
            conditions.push_str(" AND t.transaction_date >= $4");
        } else {
            conditions.push_str(" AND $4::date IS NULL");
        }
        if filter.date_to.is_some() {
            conditions.push_str(" AND t.transaction_date <= $5");
        } else {
            conditions.push_str(" AND $5::date IS NULL");
        }
        if filter.search.is_some() {
            conditions.push_str(" AND (t.transaction_number ILIKE $6 OR c.name ILIKE $6)");
        } else {
            conditions.push_str(" AND $6 = ''");
        }

        let kind_param = filter.kind.map(|k| k.as_str().to_string()).unwrap_or_default();
        let status_param = filter
            .payment_status
            .map(|s| s.as_str().to_string())
            .unwrap_or_default();
        let search_param = filter
            .search
            .map(|s| format!("%{s}%"))
            .unwrap_or_default();

        let count_sql = format!(
            r#"
            SELECT COUNT(*) FROM transactions t
            JOIN contacts c ON c.id = t.contact_id
            WHERE t.deleted_at IS NULL{conditions}
            "#,
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&kind_param)
            .bind(&status_param)
            .bind(filter.contact_id)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .bind(&search_param)
            .fetch_one(&self.db)
            .await?;

        let list_sql = format!(
            r#"
            SELECT t.id, t.transaction_number, t.transaction_date, t.kind,
                   t.contact_id, c.name AS contact_name, t.total_amount,
                   t.paid_amount, t.payment_status, t.created_at
            FROM transactions t
            JOIN contacts c ON c.id = t.contact_id
            WHERE t.deleted_at IS NULL{conditions}
            ORDER BY t.transaction_date DESC, t.created_at DESC
            LIMIT $7 OFFSET $8
            "#,
        );
        let items = sqlx::query_as::<_, TransactionSummary>(&list_sql)
            .bind(&kind_param)
            .bind(&status_param)
            .bind(filter.contact_id)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .bind(&search_param)
            .bind(pagination.per_page as i64)
            .bind(pagination.offset() as i64)
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse::new(items, total as u64, &pagination))
    }

    fn validate_input(input: &CreateTransactionInput) -> AppResult<()> {
        if input.lines.is_empty() {
            return Err(AppError::Validation(
                "Transaction requires at least one line".to_string(),
            ));
        }
        for line in &input.lines {
            if line.quantity <= 0 {
                return Err(AppError::Validation(format!(
                    "Quantity must be positive for product {}",
                    line.product_id
                )));
            }
            if line.unit_price < Decimal::ZERO {
                return Err(AppError::Validation(format!(
                    "Unit price can't be negative for product {}",
                    line.product_id
                )));
            }
            if line.container_id.is_none() {
                return Err(Self::missing_container(line.product_id));
            }
        }
        if input.tax_amount < Decimal::ZERO || input.discount_amount < Decimal::ZERO {
            return Err(AppError::Validation(
                "Tax and discount amounts can't be negative".to_string(),
            ));
        }
        if input.paid_amount < Decimal::ZERO {
            return Err(AppError::Validation(
                "Paid amount can't be negative".to_string(),
            ));
        }
        if input.paid_amount > Decimal::ZERO && input.payment_method.is_none() {
            return Err(AppError::Validation(
                "Payment method is required when paid amount is greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn missing_container(product_id: Uuid) -> AppError {
        AppError::Validation(format!(
            "A container is required for the line with product {product_id}"
        ))
    }

    async fn product_name(conn: &mut PgConnection, product_id: Uuid) -> AppResult<String> {
        let name: Option<String> = sqlx::query_scalar("SELECT name FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(conn)
            .await?;
        Ok(name.unwrap_or_else(|| product_id.to_string()))
    }
}
