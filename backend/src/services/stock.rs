//! Stock ledger service
//!
//! Owns container/product quantity state and the append-only movement
//! log. Every quantity change goes through [`adjust`], which pairs the
//! mutation 1:1 with a movement row. There is no code path that moves
//! stock without logging it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{apply_stock_delta, movement_note, StockAction, StockMovement, StockPosition};

/// Stock ledger service for positions and the movement log
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct StockPositionRow {
    id: Uuid,
    container_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<StockPositionRow> for StockPosition {
    fn from(row: StockPositionRow) -> Self {
        StockPosition {
            id: row.id,
            container_id: row.container_id,
            product_id: row.product_id,
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct StockMovementRow {
    id: Uuid,
    container_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    action: String,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<StockMovementRow> for StockMovement {
    type Error = AppError;

    fn try_from(row: StockMovementRow) -> Result<Self, Self::Error> {
        Ok(StockMovement {
            id: row.id,
            container_id: row.container_id,
            product_id: row.product_id,
            quantity: row.quantity,
            action: StockAction::from_str(&row.action).map_err(AppError::Internal)?,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

/// One desired quantity in a stock-count correction
#[derive(Debug, Deserialize)]
pub struct SetStockItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Input for a stock-count correction across one container
#[derive(Debug, Deserialize)]
pub struct SetStockInput {
    pub items: Vec<SetStockItem>,
}

/// A position joined with its product identity for read endpoints
#[derive(Debug, Serialize, FromRow)]
pub struct ContainerStockEntry {
    pub product_id: Uuid,
    pub product_name: String,
    pub size: String,
    pub packing: String,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}

/// A position joined with its container for read endpoints
#[derive(Debug, Serialize, FromRow)]
pub struct ProductStockEntry {
    pub container_id: Uuid,
    pub container_name: String,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}

/// A movement joined with product and container names
#[derive(Debug, Serialize, FromRow)]
pub struct MovementEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub container_id: Uuid,
    pub container_name: String,
    pub quantity: i32,
    pub action: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Total live quantity of a product across all containers
#[derive(Debug, Serialize)]
pub struct ProductTotal {
    pub product_id: Uuid,
    pub total_quantity: i64,
}

/// Apply one signed quantity change inside the caller's transaction.
///
/// Locks the (container, product) position `FOR UPDATE`, creates it on
/// a first positive delta, soft-deletes it when the quantity reaches
/// zero, restores it when stock comes back, and appends exactly one
/// movement row noting `old → new`.
pub async fn adjust(
    conn: &mut PgConnection,
    container_id: Uuid,
    product_id: Uuid,
    delta: i32,
    action: StockAction,
    note_prefix: &str,
) -> AppResult<StockPosition> {
    if delta == 0 {
        return Err(AppError::Validation(
            "Stock adjustment delta cannot be zero".to_string(),
        ));
    }

    // Lock the position row (soft-deleted rows included: a zeroed
    // position must be restorable) so concurrent writers serialize here.
    let existing = sqlx::query_as::<_, StockPositionRow>(
        r#"
        SELECT id, container_id, product_id, quantity, created_at, updated_at, deleted_at
        FROM stock_positions
        WHERE container_id = $1 AND product_id = $2
        FOR UPDATE
        "#,
    )
    .bind(container_id)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    let (position, old_quantity) = match existing {
        Some(row) => {
            let old_quantity = row.quantity;
            let new_quantity = apply_stock_delta(old_quantity, delta).map_err(|_| {
                AppError::Validation(format!(
                    "Insufficient stock for product {product_id} in container {container_id}: \
                     available {old_quantity}, change {delta}"
                ))
            })?;

            let updated = sqlx::query_as::<_, StockPositionRow>(
                r#"
                UPDATE stock_positions
                SET quantity = $1,
                    deleted_at = CASE WHEN $1 = 0 THEN now() ELSE NULL END,
                    updated_at = now()
                WHERE id = $2
                RETURNING id, container_id, product_id, quantity, created_at, updated_at, deleted_at
                "#,
            )
            .bind(new_quantity)
            .bind(row.id)
            .fetch_one(&mut *conn)
            .await?;

            (updated, old_quantity)
        }
        None => {
            if delta < 0 {
                return Err(AppError::NotFound(format!(
                    "Stock position for product {product_id} in container {container_id}"
                )));
            }

            let created = sqlx::query_as::<_, StockPositionRow>(
                r#"
                INSERT INTO stock_positions (container_id, product_id, quantity)
                VALUES ($1, $2, $3)
                RETURNING id, container_id, product_id, quantity, created_at, updated_at, deleted_at
                "#,
            )
            .bind(container_id)
            .bind(product_id)
            .bind(delta)
            .fetch_one(&mut *conn)
            .await?;

            (created, 0)
        }
    };

    // Exactly one movement row per successful adjustment
    sqlx::query(
        r#"
        INSERT INTO stock_movements (container_id, product_id, quantity, action, note)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(container_id)
    .bind(product_id)
    .bind(delta.abs())
    .bind(action.as_str())
    .bind(movement_note(note_prefix, old_quantity, position.quantity))
    .execute(&mut *conn)
    .await?;

    Ok(position.into())
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Stock-count correction: set absolute quantities for products in
    /// one container. Per-item deltas are computed against current
    /// state and applied through the same ledger rules, all in one
    /// unit-of-work, so a rejected item rolls the whole correction back.
    pub async fn set_all(&self, container_id: Uuid, input: SetStockInput) -> AppResult<()> {
        for item in &input.items {
            if item.quantity < 0 {
                return Err(AppError::Validation(format!(
                    "Quantity can't be negative for product {}",
                    item.product_id
                )));
            }
        }

        let mut tx = self.db.begin().await?;

        let container_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM containers WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(container_id)
        .fetch_one(&mut *tx)
        .await?;

        if !container_exists {
            return Err(AppError::NotFound("Container".to_string()));
        }

        for item in &input.items {
            let current = sqlx::query_scalar::<_, i32>(
                r#"
                SELECT quantity FROM stock_positions
                WHERE container_id = $1 AND product_id = $2
                FOR UPDATE
                "#,
            )
            .bind(container_id)
            .bind(item.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .unwrap_or(0);

            let delta = item.quantity - current;
            if delta == 0 {
                continue;
            }

            let action = if delta > 0 {
                StockAction::Added
            } else {
                StockAction::Removed
            };

            adjust(
                &mut *tx,
                container_id,
                item.product_id,
                delta,
                action,
                "Stock count",
            )
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// List live positions in a container, with product identity
    pub async fn get_container_stock(
        &self,
        container_id: Uuid,
    ) -> AppResult<Vec<ContainerStockEntry>> {
        let entries = sqlx::query_as::<_, ContainerStockEntry>(
            r#"
            SELECT sp.product_id, p.name AS product_name, p.size, p.packing,
                   sp.quantity, sp.updated_at
            FROM stock_positions sp
            JOIN products p ON p.id = sp.product_id AND p.deleted_at IS NULL
            WHERE sp.container_id = $1 AND sp.deleted_at IS NULL
            ORDER BY p.name ASC
            "#,
        )
        .bind(container_id)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    /// List the containers holding a product
    pub async fn get_product_stock(&self, product_id: Uuid) -> AppResult<Vec<ProductStockEntry>> {
        let entries = sqlx::query_as::<_, ProductStockEntry>(
            r#"
            SELECT sp.container_id, c.name AS container_name, sp.quantity, sp.updated_at
            FROM stock_positions sp
            JOIN containers c ON c.id = sp.container_id AND c.deleted_at IS NULL
            WHERE sp.product_id = $1 AND sp.deleted_at IS NULL
            ORDER BY c.name ASC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    /// Total live quantity of a product across all containers
    pub async fn get_product_total(&self, product_id: Uuid) -> AppResult<ProductTotal> {
        let total = sqlx::query_scalar::<_, Option<i64>>(
            r#"
            SELECT SUM(quantity)::BIGINT FROM stock_positions
            WHERE product_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?
        .unwrap_or(0);

        Ok(ProductTotal {
            product_id,
            total_quantity: total,
        })
    }

    /// List all movements, newest first
    pub async fn list_movements(&self) -> AppResult<Vec<MovementEntry>> {
        let movements = sqlx::query_as::<_, MovementEntry>(
            r#"
            SELECT m.id, m.product_id, p.name AS product_name,
                   m.container_id, c.name AS container_name,
                   m.quantity, m.action, m.note, m.created_at
            FROM stock_movements m
            JOIN products p ON p.id = m.product_id
            JOIN containers c ON c.id = m.container_id
            ORDER BY m.created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// List movements for a product, newest first
    pub async fn get_movements_for_product(
        &self,
        product_id: Uuid,
    ) -> AppResult<Vec<MovementEntry>> {
        let movements = sqlx::query_as::<_, MovementEntry>(
            r#"
            SELECT m.id, m.product_id, p.name AS product_name,
                   m.container_id, c.name AS container_name,
                   m.quantity, m.action, m.note, m.created_at
            FROM stock_movements m
            JOIN products p ON p.id = m.product_id
            JOIN containers c ON c.id = m.container_id
            WHERE m.product_id = $1
            ORDER BY m.created_at DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// List movements for a container, newest first
    pub async fn get_movements_for_container(
        &self,
        container_id: Uuid,
    ) -> AppResult<Vec<MovementEntry>> {
        let movements = sqlx::query_as::<_, MovementEntry>(
            r#"
            SELECT m.id, m.product_id, p.name AS product_name,
                   m.container_id, c.name AS container_name,
                   m.quantity, m.action, m.note, m.created_at
            FROM stock_movements m
            JOIN products p ON p.id = m.product_id
            JOIN containers c ON c.id = m.container_id
            WHERE m.container_id = $1
            ORDER BY m.created_at DESC
            "#,
        )
        .bind(container_id)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Fetch one movement converted to the domain model
    pub async fn get_movement(&self, movement_id: Uuid) -> AppResult<StockMovement> {
        let row = sqlx::query_as::<_, StockMovementRow>(
            r#"
            SELECT id, container_id, product_id, quantity, action, note, created_at
            FROM stock_movements
            WHERE id = $1
            "#,
        )
        .bind(movement_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock movement".to_string()))?;

        row.try_into()
    }
}
