//! Transaction (sale/purchase) models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sale or purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Sale,
    Purchase,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "sale",
            TransactionKind::Purchase => "purchase",
        }
    }

    /// Prefix used in transaction numbers (`SALE-0001`, `PUR-0001`)
    pub fn number_prefix(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "SALE",
            TransactionKind::Purchase => "PUR",
        }
    }

    /// Format the nth transaction number of this kind
    pub fn format_number(&self, sequence: i64) -> String {
        format!("{}-{:04}", self.number_prefix(), sequence)
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(TransactionKind::Sale),
            "purchase" => Ok(TransactionKind::Purchase),
            other => Err(format!("unknown transaction kind '{other}'")),
        }
    }
}

/// Payment status, a pure function of paid vs total. Never stored
/// history, always recomputed on every mutation of `paid_amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    /// The status transition function: unpaid iff nothing paid, paid iff
    /// covered in full, partial otherwise.
    pub fn from_amounts(paid_amount: Decimal, total_amount: Decimal) -> Self {
        if paid_amount <= Decimal::ZERO {
            PaymentStatus::Unpaid
        } else if paid_amount >= total_amount {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "partial" => Ok(PaymentStatus::Partial),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(format!("unknown payment status '{other}'")),
        }
    }
}

/// A sale or purchase header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub transaction_number: String,
    pub transaction_date: NaiveDate,
    pub kind: TransactionKind,
    pub contact_id: Uuid,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub invoice_url: Option<String>,
    pub invoice_checksum: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Amount still owed on this transaction
    pub fn outstanding(&self) -> Decimal {
        self.total_amount - self.paid_amount
    }
}

/// One product line within a transaction. Owned by its transaction and
/// soft-deleted with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLine {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub product_id: Uuid,
    pub container_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
