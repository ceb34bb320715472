//! Products service: catalog CRUD and batch existence validation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::Product;

/// Products service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub size: String,
    pub packing: String,
    pub default_sale_price: Option<Decimal>,
    pub default_purchase_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            size: row.size,
            packing: row.packing,
            default_sale_price: row.default_sale_price,
            default_purchase_price: row.default_purchase_price,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, size, packing, default_sale_price, \
                               default_purchase_price, created_at, updated_at, deleted_at";

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub size: String,
    pub packing: String,
    pub default_sale_price: Option<Decimal>,
    pub default_purchase_price: Option<Decimal>,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub size: Option<String>,
    pub packing: Option<String>,
    pub default_sale_price: Option<Decimal>,
    pub default_purchase_price: Option<Decimal>,
}

/// Filters for listing products
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub search: Option<String>,
}

/// A product with its total live quantity across all containers
#[derive(Debug, Serialize, FromRow)]
pub struct ProductListEntry {
    pub id: Uuid,
    pub name: String,
    pub size: String,
    pub packing: String,
    pub default_sale_price: Option<Decimal>,
    pub default_purchase_price: Option<Decimal>,
    pub total_quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Check that every id in `product_ids` refers to a live product.
/// All missing ids are reported together in a single error.
pub async fn validate_products_exist(
    conn: &mut PgConnection,
    product_ids: &[Uuid],
) -> AppResult<()> {
    if product_ids.is_empty() {
        return Ok(());
    }

    let unique: Vec<Uuid> = product_ids
        .iter()
        .copied()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let found: Vec<Uuid> = sqlx::query_scalar(
        "SELECT id FROM products WHERE id = ANY($1) AND deleted_at IS NULL",
    )
    .bind(&unique)
    .fetch_all(conn)
    .await?;

    let found: HashSet<Uuid> = found.into_iter().collect();
    let missing: Vec<Uuid> = unique.into_iter().filter(|id| !found.contains(id)).collect();

    if !missing.is_empty() {
        return Err(AppError::NotFoundIds {
            resource: "Product".to_string(),
            ids: missing,
        });
    }

    Ok(())
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product. The (name, size, packing) triple must be unique
    /// among live products.
    pub async fn create(&self, input: CreateProductInput) -> AppResult<Product> {
        Self::validate_input(&input)?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (name, size, packing, default_sale_price, default_purchase_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "#,
        ))
        .bind(&input.name)
        .bind(&input.size)
        .bind(&input.packing)
        .bind(input.default_sale_price)
        .bind(input.default_purchase_price)
        .fetch_one(&self.db)
        .await
        .map_err(|e| Self::map_unique_violation(e, &input))?;

        Ok(row.into())
    }

    /// Create several products in one unit-of-work. Fails as a whole if
    /// any one of them collides with an existing product.
    pub async fn create_bulk(&self, inputs: Vec<CreateProductInput>) -> AppResult<Vec<Product>> {
        if inputs.is_empty() {
            return Err(AppError::Validation(
                "At least one product is required".to_string(),
            ));
        }
        for input in &inputs {
            Self::validate_input(input)?;
        }

        let mut tx = self.db.begin().await?;
        let mut created = Vec::with_capacity(inputs.len());

        for input in inputs {
            let row = sqlx::query_as::<_, ProductRow>(&format!(
                r#"
                INSERT INTO products (name, size, packing, default_sale_price, default_purchase_price)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {PRODUCT_COLUMNS}
                "#,
            ))
            .bind(&input.name)
            .bind(&input.size)
            .bind(&input.packing)
            .bind(input.default_sale_price)
            .bind(input.default_purchase_price)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| Self::map_unique_violation(e, &input))?;

            created.push(row.into());
        }

        tx.commit().await?;
        Ok(created)
    }

    /// List live products with their total quantities, optionally
    /// filtered by a name/size/packing search
    pub async fn list(&self, filter: ProductFilter) -> AppResult<Vec<ProductListEntry>> {
        let mut sql = String::from(
            r#"
            SELECT p.id, p.name, p.size, p.packing, p.default_sale_price,
                   p.default_purchase_price,
                   COALESCE(SUM(sp.quantity), 0)::BIGINT AS total_quantity,
                   p.created_at, p.updated_at
            FROM products p
            LEFT JOIN stock_positions sp
                ON sp.product_id = p.id AND sp.deleted_at IS NULL
            WHERE p.deleted_at IS NULL
            "#,
        );

        if filter.search.is_some() {
            sql.push_str(" AND (p.name ILIKE $1 OR p.size ILIKE $1 OR p.packing ILIKE $1)");
        } else {
            sql.push_str(" AND $1 = ''");
        }

        sql.push_str(" GROUP BY p.id ORDER BY p.name ASC, p.size ASC");

        let search_param = filter
            .search
            .map(|s| format!("%{s}%"))
            .unwrap_or_default();

        let entries = sqlx::query_as::<_, ProductListEntry>(&sql)
            .bind(search_param)
            .fetch_all(&self.db)
            .await?;

        Ok(entries)
    }

    /// Fetch one live product
    pub async fn get(&self, product_id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND deleted_at IS NULL",
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// Update a product
    pub async fn update(&self, product_id: Uuid, input: UpdateProductInput) -> AppResult<Product> {
        let existing = self.get(product_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let size = input.size.unwrap_or(existing.size);
        let packing = input.packing.unwrap_or(existing.packing);
        let default_sale_price = input.default_sale_price.or(existing.default_sale_price);
        let default_purchase_price = input
            .default_purchase_price
            .or(existing.default_purchase_price);

        if name.trim().is_empty() {
            return Err(AppError::Validation("Product name is required".to_string()));
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET name = $1, size = $2, packing = $3,
                default_sale_price = $4, default_purchase_price = $5,
                updated_at = now()
            WHERE id = $6
            RETURNING {PRODUCT_COLUMNS}
            "#,
        ))
        .bind(&name)
        .bind(&size)
        .bind(&packing)
        .bind(default_sale_price)
        .bind(default_purchase_price)
        .bind(product_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry(format!(
                    "Product '{name}' ({size}, {packing}) already exists"
                ))
            } else {
                e.into()
            }
        })?;

        Ok(row.into())
    }

    /// Soft delete a product
    pub async fn remove(&self, product_id: Uuid) -> AppResult<()> {
        let affected = sqlx::query(
            "UPDATE products SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(product_id)
        .execute(&self.db)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(())
    }

    fn validate_input(input: &CreateProductInput) -> AppResult<()> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation("Product name is required".to_string()));
        }
        if input.size.trim().is_empty() {
            return Err(AppError::Validation("Product size is required".to_string()));
        }
        if input.packing.trim().is_empty() {
            return Err(AppError::Validation(
                "Product packing is required".to_string(),
            ));
        }
        Ok(())
    }

    fn map_unique_violation(e: sqlx::Error, input: &CreateProductInput) -> AppError {
        if is_unique_violation(&e) {
            AppError::DuplicateEntry(format!(
                "Product '{}' ({}, {}) already exists",
                input.name, input.size, input.packing
            ))
        } else {
            e.into()
        }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}
