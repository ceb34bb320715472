//! Contacts service: counterparty management and the balance primitive
//!
//! `adjust_balance` is the only code allowed to touch `Contact.balance`;
//! it runs inside whatever unit-of-work the caller has open.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgConnection, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{Contact, ContactType};

/// Contacts service for managing customers and suppliers
#[derive(Clone)]
pub struct ContactService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
pub(crate) struct ContactRow {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub gstin: Option<String>,
    pub contact_type: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ContactRow> for Contact {
    type Error = AppError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        Ok(Contact {
            id: row.id,
            name: row.name,
            phone: row.phone,
            address: row.address,
            gstin: row.gstin,
            contact_type: ContactType::from_str(&row.contact_type).map_err(AppError::Internal)?,
            balance: row.balance,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

const CONTACT_COLUMNS: &str = "id, name, phone, address, gstin, contact_type, balance, \
                               created_at, updated_at, deleted_at";

/// Input for creating a contact
#[derive(Debug, Deserialize)]
pub struct CreateContactInput {
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub gstin: Option<String>,
    pub contact_type: ContactType,
}

/// Input for updating a contact. Balance is deliberately absent: it is
/// only ever moved by the ledger.
#[derive(Debug, Deserialize)]
pub struct UpdateContactInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gstin: Option<String>,
    pub contact_type: Option<ContactType>,
}

/// Filters for listing contacts
#[derive(Debug, Default, Deserialize)]
pub struct ContactFilter {
    pub contact_type: Option<ContactType>,
    /// "positive" (receivables) or "negative" (payables)
    pub balance: Option<String>,
    pub search: Option<String>,
}

/// Move a contact's balance by a signed amount inside the caller's
/// transaction. Positive deltas mean the contact owes the business more.
pub async fn adjust_balance(
    conn: &mut PgConnection,
    contact_id: Uuid,
    delta: Decimal,
) -> AppResult<()> {
    if delta == Decimal::ZERO {
        return Ok(());
    }

    let affected = sqlx::query(
        r#"
        UPDATE contacts
        SET balance = balance + $1, updated_at = now()
        WHERE id = $2 AND deleted_at IS NULL
        "#,
    )
    .bind(delta)
    .bind(contact_id)
    .execute(conn)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(AppError::NotFound("Contact".to_string()));
    }

    Ok(())
}

impl ContactService {
    /// Create a new ContactService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a contact
    pub async fn create(&self, input: CreateContactInput) -> AppResult<Contact> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation("Contact name is required".to_string()));
        }

        let row = sqlx::query_as::<_, ContactRow>(&format!(
            r#"
            INSERT INTO contacts (name, phone, address, gstin, contact_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CONTACT_COLUMNS}
            "#,
        ))
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.gstin)
        .bind(input.contact_type.as_str())
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    /// List contacts with optional type/balance/search filters
    pub async fn list(&self, filter: ContactFilter) -> AppResult<Vec<Contact>> {
        let mut sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE deleted_at IS NULL");

        if filter.contact_type.is_some() {
            sql.push_str(" AND contact_type = $1");
        } else {
            sql.push_str(" AND $1 = ''");
        }

        match filter.balance.as_deref() {
            Some("positive") => sql.push_str(" AND balance > 0"),
            Some("negative") => sql.push_str(" AND balance < 0"),
            _ => {}
        }

        if filter.search.is_some() {
            sql.push_str(" AND (name ILIKE $2 OR phone ILIKE $2)");
        } else {
            sql.push_str(" AND $2 = ''");
        }

        sql.push_str(" ORDER BY name ASC");

        let type_param = filter
            .contact_type
            .map(|t| t.as_str().to_string())
            .unwrap_or_default();
        let search_param = filter
            .search
            .map(|s| format!("%{s}%"))
            .unwrap_or_default();

        let rows = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(type_param)
            .bind(search_param)
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(Contact::try_from).collect()
    }

    /// Fetch one live contact
    pub async fn get(&self, contact_id: Uuid) -> AppResult<Contact> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1 AND deleted_at IS NULL",
        ))
        .bind(contact_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Contact".to_string()))?;

        row.try_into()
    }

    /// Update contact fields (never the balance)
    pub async fn update(&self, contact_id: Uuid, input: UpdateContactInput) -> AppResult<Contact> {
        let existing = self.get(contact_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let phone = input.phone.unwrap_or(existing.phone);
        let address = input.address.or(existing.address);
        let gstin = input.gstin.or(existing.gstin);
        let contact_type = input.contact_type.unwrap_or(existing.contact_type);

        let row = sqlx::query_as::<_, ContactRow>(&format!(
            r#"
            UPDATE contacts
            SET name = $1, phone = $2, address = $3, gstin = $4, contact_type = $5,
                updated_at = now()
            WHERE id = $6
            RETURNING {CONTACT_COLUMNS}
            "#,
        ))
        .bind(&name)
        .bind(&phone)
        .bind(&address)
        .bind(&gstin)
        .bind(contact_type.as_str())
        .bind(contact_id)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    /// Soft delete a contact
    pub async fn remove(&self, contact_id: Uuid) -> AppResult<()> {
        let affected = sqlx::query(
            "UPDATE contacts SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(contact_id)
        .execute(&self.db)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(AppError::NotFound("Contact".to_string()));
        }

        Ok(())
    }

    /// Validate that a contact exists and can stand on the buying side
    /// of a sale. Runs inside the caller's unit-of-work.
    pub async fn validate_for_sale(
        conn: &mut PgConnection,
        contact_id: Uuid,
    ) -> AppResult<Contact> {
        let contact = Self::fetch_live(conn, contact_id).await?;

        if !contact.contact_type.can_buy() {
            return Err(AppError::Validation(format!(
                "Contact '{}' is not a customer. Only customers or mixed contacts can be used for sales.",
                contact.name
            )));
        }

        Ok(contact)
    }

    /// Validate that a contact exists and can stand on the supplying
    /// side of a purchase. Runs inside the caller's unit-of-work.
    pub async fn validate_for_purchase(
        conn: &mut PgConnection,
        contact_id: Uuid,
    ) -> AppResult<Contact> {
        let contact = Self::fetch_live(conn, contact_id).await?;

        if !contact.contact_type.can_supply() {
            return Err(AppError::Validation(format!(
                "Contact '{}' is not a supplier. Only suppliers or mixed contacts can be used for purchases.",
                contact.name
            )));
        }

        Ok(contact)
    }

    async fn fetch_live(conn: &mut PgConnection, contact_id: Uuid) -> AppResult<Contact> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1 AND deleted_at IS NULL",
        ))
        .bind(contact_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Contact".to_string()))?;

        row.try_into()
    }
}
