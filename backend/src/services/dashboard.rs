//! Dashboard service: aggregate figures for the landing screen

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;

/// Dashboard service
#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
}

/// Everything the dashboard shows in one payload
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub product_count: i64,
    pub container_count: i64,
    pub contact_count: i64,
    pub total_stock: i64,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub recent_transactions: Vec<RecentTransaction>,
    pub top_outstanding: Vec<OutstandingContact>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct RecentTransaction {
    pub id: Uuid,
    pub transaction_number: String,
    pub transaction_date: NaiveDate,
    pub kind: String,
    pub contact_name: String,
    pub total_amount: Decimal,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct OutstandingContact {
    pub id: Uuid,
    pub name: String,
    pub contact_type: String,
    pub balance: Decimal,
}

impl DashboardService {
    /// Create a new DashboardService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Collect all dashboard figures
    pub async fn summary(&self) -> AppResult<DashboardSummary> {
        let product_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL")
                .fetch_one(&self.db)
                .await?;

        let container_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM containers WHERE deleted_at IS NULL")
                .fetch_one(&self.db)
                .await?;

        let contact_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM contacts WHERE deleted_at IS NULL")
                .fetch_one(&self.db)
                .await?;

        let total_stock: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(quantity)::BIGINT FROM stock_positions WHERE deleted_at IS NULL",
        )
        .fetch_one(&self.db)
        .await?;

        let total_income: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(amount) FROM payments WHERE kind = 'income' AND deleted_at IS NULL",
        )
        .fetch_one(&self.db)
        .await?;

        let total_expense: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(amount) FROM payments WHERE kind = 'expense' AND deleted_at IS NULL",
        )
        .fetch_one(&self.db)
        .await?;

        let recent_transactions = sqlx::query_as::<_, RecentTransaction>(
            r#"
            SELECT t.id, t.transaction_number, t.transaction_date, t.kind,
                   c.name AS contact_name, t.total_amount, t.payment_status, t.created_at
            FROM transactions t
            JOIN contacts c ON c.id = t.contact_id
            WHERE t.deleted_at IS NULL
            ORDER BY t.created_at DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let top_outstanding = sqlx::query_as::<_, OutstandingContact>(
            r#"
            SELECT id, name, contact_type, balance
            FROM contacts
            WHERE deleted_at IS NULL AND balance <> 0
            ORDER BY ABS(balance) DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(DashboardSummary {
            product_count,
            container_count,
            contact_count,
            total_stock: total_stock.unwrap_or(0),
            total_income: total_income.unwrap_or(Decimal::ZERO),
            total_expense: total_expense.unwrap_or(Decimal::ZERO),
            recent_transactions,
            top_outstanding,
        })
    }
}
