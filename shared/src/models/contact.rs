//! Contact (counterparty) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What side of a trade a contact can stand on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    Customer,
    Supplier,
    Both,
}

impl ContactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactType::Customer => "customer",
            ContactType::Supplier => "supplier",
            ContactType::Both => "both",
        }
    }

    /// Can this contact be the counterparty of a sale?
    pub fn can_buy(&self) -> bool {
        matches!(self, ContactType::Customer | ContactType::Both)
    }

    /// Can this contact be the counterparty of a purchase?
    pub fn can_supply(&self) -> bool {
        matches!(self, ContactType::Supplier | ContactType::Both)
    }
}

impl std::str::FromStr for ContactType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(ContactType::Customer),
            "supplier" => Ok(ContactType::Supplier),
            "both" => Ok(ContactType::Both),
            other => Err(format!("unknown contact type '{other}'")),
        }
    }
}

/// A customer, supplier, or both.
///
/// `balance` is a signed running total: positive means the contact owes
/// the business (receivable), negative means the business owes the
/// contact (payable). It is only ever mutated through the balance
/// adjustment primitive, never assigned directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub gstin: Option<String>,
    pub contact_type: ContactType,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
