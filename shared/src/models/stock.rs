//! Stock position and movement models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cause of a stock movement. Fixed vocabulary; every quantity change
/// carries exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockAction {
    Sale,
    Purchase,
    Added,
    Removed,
}

impl StockAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockAction::Sale => "sale",
            StockAction::Purchase => "purchase",
            StockAction::Added => "added",
            StockAction::Removed => "removed",
        }
    }
}

impl std::str::FromStr for StockAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(StockAction::Sale),
            "purchase" => Ok(StockAction::Purchase),
            "added" => Ok(StockAction::Added),
            "removed" => Ok(StockAction::Removed),
            other => Err(format!("unknown stock action '{other}'")),
        }
    }
}

/// Current quantity of a product in a specific container. The only
/// place quantity-on-hand lives; unique per (container, product).
/// A position that reaches zero is soft-deleted, and restored when
/// stock comes back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockPosition {
    pub id: Uuid,
    pub container_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Append-only audit row recording one quantity change and its cause.
/// Never mutated or deleted after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub container_id: Uuid,
    pub product_id: Uuid,
    /// Magnitude of the change (always positive; direction is in `action`)
    pub quantity: i32,
    pub action: StockAction,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Render the human-readable before/after note attached to a movement,
/// e.g. `"Sale SALE-0003 - 10 → 5"`.
pub fn movement_note(prefix: &str, old_quantity: i32, new_quantity: i32) -> String {
    format!("{prefix} - {old_quantity} → {new_quantity}")
}
