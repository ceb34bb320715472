//! Payments service
//!
//! Records settlements against transactions and manages freestanding
//! manual payments. Any mutation of a linked payment re-derives the
//! transaction's `paid_amount` from the sum of its live payments
//! instead of adjusting incrementally, so the two can never drift.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::contact;
use crate::services::transaction::{TransactionRow, TRANSACTION_COLUMNS};
use shared::{
    balance_effect_on_payment, Payment, PaymentKind, PaymentMethod, PaymentStatus, Transaction,
    TransactionKind,
};

/// Payments service
#[derive(Clone)]
pub struct PaymentService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: Uuid,
    transaction_id: Option<Uuid>,
    contact_id: Option<Uuid>,
    payment_date: NaiveDate,
    amount: Decimal,
    kind: String,
    payment_method: String,
    category: Option<String>,
    description: Option<String>,
    reference_number: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = AppError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            transaction_id: row.transaction_id,
            contact_id: row.contact_id,
            payment_date: row.payment_date,
            amount: row.amount,
            kind: PaymentKind::from_str(&row.kind).map_err(AppError::Internal)?,
            payment_method: PaymentMethod::from_str(&row.payment_method)
                .map_err(AppError::Internal)?,
            category: row.category,
            description: row.description,
            reference_number: row.reference_number,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

const PAYMENT_COLUMNS: &str =
    "id, transaction_id, contact_id, payment_date, amount, kind, payment_method, category, \
     description, reference_number, notes, created_at, updated_at, deleted_at";

/// Input for recording a payment against a transaction
#[derive(Debug, Deserialize)]
pub struct RecordPaymentInput {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

/// Input for creating a freestanding manual payment
#[derive(Debug, Deserialize)]
pub struct CreateManualPaymentInput {
    pub payment_date: NaiveDate,
    pub amount: Decimal,
    pub kind: PaymentKind,
    pub payment_method: PaymentMethod,
    pub category: String,
    pub description: String,
    pub contact_id: Option<Uuid>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

/// Input for updating a payment
#[derive(Debug, Deserialize)]
pub struct UpdatePaymentInput {
    pub payment_date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

/// Filters for listing payments
#[derive(Debug, Default, Deserialize)]
pub struct PaymentFilter {
    pub kind: Option<PaymentKind>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub category: Option<String>,
}

/// Totals for one manual-payment category
#[derive(Debug, Serialize, FromRow)]
pub struct CategoryTotal {
    pub category: Option<String>,
    pub kind: String,
    pub total: Decimal,
}

/// Manual-payment totals over a date range
#[derive(Debug, Serialize)]
pub struct PaymentSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net: Decimal,
    pub by_category: Vec<CategoryTotal>,
}

/// Live payments linked to a transaction, oldest first
pub(crate) async fn fetch_for_transaction(
    db: &PgPool,
    transaction_id: Uuid,
) -> AppResult<Vec<Payment>> {
    let rows = sqlx::query_as::<_, PaymentRow>(&format!(
        r#"
        SELECT {PAYMENT_COLUMNS} FROM payments
        WHERE transaction_id = $1 AND deleted_at IS NULL
        ORDER BY payment_date ASC, created_at ASC
        "#,
    ))
    .bind(transaction_id)
    .fetch_all(db)
    .await?;

    rows.into_iter().map(Payment::try_from).collect()
}

impl PaymentService {
    /// Create a new PaymentService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a payment against a transaction.
    ///
    /// Validates the amount against the remaining balance, inserts the
    /// payment, bumps `paid_amount`, recomputes the status, and moves
    /// the counterparty balance, all in one unit-of-work.
    pub async fn record_payment(
        &self,
        transaction_id: Uuid,
        input: RecordPaymentInput,
    ) -> AppResult<Transaction> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Payment amount must be positive".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let header = lock_transaction(&mut tx, transaction_id).await?;
        let kind = TransactionKind::from_str(&header.kind).map_err(AppError::Internal)?;

        let remaining = header.total_amount - header.paid_amount;
        if remaining <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Transaction is already fully paid".to_string(),
            ));
        }
        if input.amount > remaining {
            return Err(AppError::Validation(format!(
                "Payment amount {} exceeds remaining balance {}",
                input.amount, remaining
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO payments
                (transaction_id, contact_id, payment_date, amount, kind, payment_method,
                 reference_number, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(transaction_id)
        .bind(header.contact_id)
        .bind(input.payment_date)
        .bind(input.amount)
        .bind(PaymentKind::for_transaction(kind).as_str())
        .bind(input.payment_method.as_str())
        .bind(&input.reference_number)
        .bind(&input.notes)
        .execute(&mut *tx)
        .await?;

        let new_paid = header.paid_amount + input.amount;
        let status = PaymentStatus::from_amounts(new_paid, header.total_amount);

        let updated = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            UPDATE transactions
            SET paid_amount = $1, payment_status = $2, updated_at = now()
            WHERE id = $3
            RETURNING {TRANSACTION_COLUMNS}
            "#,
        ))
        .bind(new_paid)
        .bind(status.as_str())
        .bind(transaction_id)
        .fetch_one(&mut *tx)
        .await?;

        contact::adjust_balance(
            &mut *tx,
            header.contact_id,
            balance_effect_on_payment(kind, input.amount),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            transaction_number = %header.transaction_number,
            amount = %input.amount,
            "Payment recorded"
        );

        updated.try_into()
    }

    /// Create a freestanding manual payment (category and description
    /// required, no transaction link)
    pub async fn create_manual(&self, input: CreateManualPaymentInput) -> AppResult<Payment> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Payment amount must be positive".to_string(),
            ));
        }
        if input.category.trim().is_empty() {
            return Err(AppError::Validation(
                "Category is required for a manual payment".to_string(),
            ));
        }
        if input.description.trim().is_empty() {
            return Err(AppError::Validation(
                "Description is required for a manual payment".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            INSERT INTO payments
                (contact_id, payment_date, amount, kind, payment_method, category,
                 description, reference_number, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PAYMENT_COLUMNS}
            "#,
        ))
        .bind(input.contact_id)
        .bind(input.payment_date)
        .bind(input.amount)
        .bind(input.kind.as_str())
        .bind(input.payment_method.as_str())
        .bind(&input.category)
        .bind(&input.description)
        .bind(&input.reference_number)
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    /// List live payments with filters, newest first
    pub async fn list(&self, filter: PaymentFilter) -> AppResult<Vec<Payment>> {
        let mut sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE deleted_at IS NULL");

        if filter.kind.is_some() {
            sql.push_str(" AND kind = $1");
        } else {
            sql.push_str(" AND $1 = ''");
        }
        if filter.date_from.is_some() {
            sql.push_str(" AND payment_date >= $2");
        } else {
            sql.push_str(" AND $2::date IS NULL");
        }
        if filter.date_to.is_some() {
            sql.push_str(" AND payment_date <= $3");
        } else {
            sql.push_str(" AND $3::date IS NULL");
        }
        if filter.category.is_some() {
            sql.push_str(" AND category = $4");
        } else {
            sql.push_str(" AND $4 = ''");
        }

        sql.push_str(" ORDER BY payment_date DESC, created_at DESC");

        let kind_param = filter.kind.map(|k| k.as_str().to_string()).unwrap_or_default();

        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(kind_param)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .bind(filter.category.unwrap_or_default())
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    /// Fetch one live payment
    pub async fn get(&self, payment_id: Uuid) -> AppResult<Payment> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 AND deleted_at IS NULL",
        ))
        .bind(payment_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment".to_string()))?;

        row.try_into()
    }

    /// Update a payment. For a transaction-linked payment the
    /// transaction's `paid_amount`, status, and counterparty balance
    /// are re-derived in the same unit-of-work.
    pub async fn update(&self, payment_id: Uuid, input: UpdatePaymentInput) -> AppResult<Payment> {
        if let Some(amount) = input.amount {
            if amount <= Decimal::ZERO {
                return Err(AppError::Validation(
                    "Payment amount must be positive".to_string(),
                ));
            }
        }

        let mut tx = self.db.begin().await?;

        let existing = lock_payment(&mut tx, payment_id).await?;

        let payment_date = input.payment_date.unwrap_or(existing.payment_date);
        let amount = input.amount.unwrap_or(existing.amount);
        let payment_method = input
            .payment_method
            .map(|m| m.as_str().to_string())
            .unwrap_or(existing.payment_method);
        let category = input.category.or(existing.category);
        let description = input.description.or(existing.description);
        let reference_number = input.reference_number.or(existing.reference_number);
        let notes = input.notes.or(existing.notes);

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            UPDATE payments
            SET payment_date = $1, amount = $2, payment_method = $3, category = $4,
                description = $5, reference_number = $6, notes = $7, updated_at = now()
            WHERE id = $8
            RETURNING {PAYMENT_COLUMNS}
            "#,
        ))
        .bind(payment_date)
        .bind(amount)
        .bind(&payment_method)
        .bind(&category)
        .bind(&description)
        .bind(&reference_number)
        .bind(&notes)
        .bind(payment_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(transaction_id) = existing.transaction_id {
            reconcile_transaction(&mut tx, transaction_id).await?;
        }

        tx.commit().await?;

        row.try_into()
    }

    /// Soft-delete a payment, re-deriving the linked transaction's
    /// paid amount, status, and counterparty balance
    pub async fn remove(&self, payment_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let existing = lock_payment(&mut tx, payment_id).await?;

        sqlx::query("UPDATE payments SET deleted_at = now(), updated_at = now() WHERE id = $1")
            .bind(payment_id)
            .execute(&mut *tx)
            .await?;

        if let Some(transaction_id) = existing.transaction_id {
            reconcile_transaction(&mut tx, transaction_id).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Manual-payment totals over a date range, split into earnings and
    /// spends with a per-category breakdown
    pub async fn summary(
        &self,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> AppResult<PaymentSummary> {
        let by_category = sqlx::query_as::<_, CategoryTotal>(
            r#"
            SELECT category, kind, SUM(amount) AS total
            FROM payments
            WHERE deleted_at IS NULL AND transaction_id IS NULL
              AND ($1::date IS NULL OR payment_date >= $1)
              AND ($2::date IS NULL OR payment_date <= $2)
            GROUP BY category, kind
            ORDER BY kind, category
            "#,
        )
        .bind(date_from)
        .bind(date_to)
        .fetch_all(&self.db)
        .await?;

        let mut total_income = Decimal::ZERO;
        let mut total_expense = Decimal::ZERO;
        for entry in &by_category {
            match entry.kind.as_str() {
                "income" => total_income += entry.total,
                _ => total_expense += entry.total,
            }
        }

        Ok(PaymentSummary {
            total_income,
            total_expense,
            net: total_income - total_expense,
            by_category,
        })
    }
}

async fn lock_transaction(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    transaction_id: Uuid,
) -> AppResult<TransactionRow> {
    sqlx::query_as::<_, TransactionRow>(&format!(
        r#"
        SELECT {TRANSACTION_COLUMNS} FROM transactions
        WHERE id = $1 AND deleted_at IS NULL
        FOR UPDATE
        "#,
    ))
    .bind(transaction_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Transaction".to_string()))
}

async fn lock_payment(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    payment_id: Uuid,
) -> AppResult<PaymentRow> {
    sqlx::query_as::<_, PaymentRow>(&format!(
        r#"
        SELECT {PAYMENT_COLUMNS} FROM payments
        WHERE id = $1 AND deleted_at IS NULL
        FOR UPDATE
        "#,
    ))
    .bind(payment_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Payment".to_string()))
}

/// Re-derive a transaction's `paid_amount` from the sum of its live
/// payments, recompute the status, and move the counterparty balance by
/// the difference. The sum, never incremental arithmetic, is the
/// authority.
async fn reconcile_transaction(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    transaction_id: Uuid,
) -> AppResult<()> {
    let header = lock_transaction(tx, transaction_id).await?;
    let kind = TransactionKind::from_str(&header.kind).map_err(AppError::Internal)?;

    let paid: Option<Decimal> = sqlx::query_scalar(
        "SELECT SUM(amount) FROM payments WHERE transaction_id = $1 AND deleted_at IS NULL",
    )
    .bind(transaction_id)
    .fetch_one(&mut **tx)
    .await?;
    let paid = paid.unwrap_or(Decimal::ZERO);

    if paid > header.total_amount {
        return Err(AppError::Validation(format!(
            "Payments total {} would exceed transaction total {}",
            paid, header.total_amount
        )));
    }

    let status = PaymentStatus::from_amounts(paid, header.total_amount);

    sqlx::query(
        r#"
        UPDATE transactions
        SET paid_amount = $1, payment_status = $2, updated_at = now()
        WHERE id = $3
        "#,
    )
    .bind(paid)
    .bind(status.as_str())
    .bind(transaction_id)
    .execute(&mut **tx)
    .await?;

    // Linear in the delta, so a reduction applies the inverse effect
    let delta = paid - header.paid_amount;
    if delta != Decimal::ZERO {
        contact::adjust_balance(&mut **tx, header.contact_id, balance_effect_on_payment(kind, delta))
            .await?;
    }

    Ok(())
}
