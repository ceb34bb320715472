//! Payment models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Upi,
    Cheque,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Other => "other",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "upi" => Ok(PaymentMethod::Upi),
            "cheque" => Ok(PaymentMethod::Cheque),
            "other" => Ok(PaymentMethod::Other),
            other => Err(format!("unknown payment method '{other}'")),
        }
    }
}

/// Direction of money for a payment. Derived from the transaction kind
/// for linked payments; supplied by the caller for manual ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Income,
    Expense,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Income => "income",
            PaymentKind::Expense => "expense",
        }
    }

    /// Money direction for a payment settling a transaction
    pub fn for_transaction(kind: super::TransactionKind) -> Self {
        match kind {
            super::TransactionKind::Sale => PaymentKind::Income,
            super::TransactionKind::Purchase => PaymentKind::Expense,
        }
    }
}

impl std::str::FromStr for PaymentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(PaymentKind::Income),
            "expense" => Ok(PaymentKind::Expense),
            other => Err(format!("unknown payment kind '{other}'")),
        }
    }
}

/// A monetary settlement. Either linked to a transaction
/// (`transaction_id` set) or freestanding/manual, in which case a
/// category and description are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub transaction_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
    pub kind: PaymentKind,
    pub payment_method: PaymentMethod,
    pub category: Option<String>,
    pub description: Option<String>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Categories offered by the UI for manual payments. Free text is
/// still accepted; these are only suggestions.
pub const SUGGESTED_PAYMENT_CATEGORIES: &[&str] = &[
    "rent",
    "salaries",
    "utilities",
    "transport",
    "supplies",
    "maintenance",
    "miscellaneous",
];
