//! Product models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sellable or purchasable item. Identity is the (name, size, packing)
/// triple, which is unique among live products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub size: String,
    pub packing: String,
    /// Default prices, overridable per transaction line
    pub default_sale_price: Option<Decimal>,
    pub default_purchase_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
