//! Containers service: storage location CRUD

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{Container, ContainerType};

/// Containers service
#[derive(Clone)]
pub struct ContainerService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
pub(crate) struct ContainerRow {
    pub id: Uuid,
    pub name: String,
    pub container_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ContainerRow> for Container {
    type Error = AppError;

    fn try_from(row: ContainerRow) -> Result<Self, Self::Error> {
        Ok(Container {
            id: row.id,
            name: row.name,
            container_type: ContainerType::from_str(&row.container_type)
                .map_err(AppError::Internal)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

const CONTAINER_COLUMNS: &str = "id, name, container_type, created_at, updated_at, deleted_at";

/// Input for creating a container
#[derive(Debug, Deserialize)]
pub struct CreateContainerInput {
    pub name: String,
    pub container_type: ContainerType,
}

/// Input for updating a container
#[derive(Debug, Deserialize)]
pub struct UpdateContainerInput {
    pub name: Option<String>,
    pub container_type: Option<ContainerType>,
}

impl ContainerService {
    /// Create a new ContainerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a container. Names are unique among live containers.
    pub async fn create(&self, input: CreateContainerInput) -> AppResult<Container> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation(
                "Container name is required".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, ContainerRow>(&format!(
            r#"
            INSERT INTO containers (name, container_type)
            VALUES ($1, $2)
            RETURNING {CONTAINER_COLUMNS}
            "#,
        ))
        .bind(&input.name)
        .bind(input.container_type.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AppError::DuplicateEntry(format!("Container '{}' already exists", input.name))
            }
            _ => e.into(),
        })?;

        row.try_into()
    }

    /// List live containers
    pub async fn list(&self) -> AppResult<Vec<Container>> {
        let rows = sqlx::query_as::<_, ContainerRow>(&format!(
            "SELECT {CONTAINER_COLUMNS} FROM containers WHERE deleted_at IS NULL ORDER BY name ASC",
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Container::try_from).collect()
    }

    /// Fetch one live container
    pub async fn get(&self, container_id: Uuid) -> AppResult<Container> {
        let row = sqlx::query_as::<_, ContainerRow>(&format!(
            "SELECT {CONTAINER_COLUMNS} FROM containers WHERE id = $1 AND deleted_at IS NULL",
        ))
        .bind(container_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Container".to_string()))?;

        row.try_into()
    }

    /// Update a container
    pub async fn update(
        &self,
        container_id: Uuid,
        input: UpdateContainerInput,
    ) -> AppResult<Container> {
        let existing = self.get(container_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let container_type = input.container_type.unwrap_or(existing.container_type);

        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "Container name is required".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, ContainerRow>(&format!(
            r#"
            UPDATE containers
            SET name = $1, container_type = $2, updated_at = now()
            WHERE id = $3
            RETURNING {CONTAINER_COLUMNS}
            "#,
        ))
        .bind(&name)
        .bind(container_type.as_str())
        .bind(container_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AppError::DuplicateEntry(format!("Container '{name}' already exists"))
            }
            _ => e.into(),
        })?;

        row.try_into()
    }

    /// Soft delete a container. Refused while it still holds stock.
    pub async fn remove(&self, container_id: Uuid) -> AppResult<()> {
        let held: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(quantity)::BIGINT FROM stock_positions
            WHERE container_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(container_id)
        .fetch_one(&self.db)
        .await?;

        if held.unwrap_or(0) > 0 {
            return Err(AppError::Conflict(
                "Container still holds stock and cannot be deleted".to_string(),
            ));
        }

        let affected = sqlx::query(
            "UPDATE containers SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(container_id)
        .execute(&self.db)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(AppError::NotFound("Container".to_string()));
        }

        Ok(())
    }
}
