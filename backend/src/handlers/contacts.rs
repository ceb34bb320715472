//! HTTP handlers for contacts

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::contact::{
    ContactFilter, ContactService, CreateContactInput, UpdateContactInput,
};
use crate::AppState;
use shared::Contact;

/// Create a contact
pub async fn create_contact(
    State(state): State<AppState>,
    Json(input): Json<CreateContactInput>,
) -> AppResult<(StatusCode, Json<Contact>)> {
    let service = ContactService::new(state.db);
    let contact = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// List contacts with optional filters
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(filter): Query<ContactFilter>,
) -> AppResult<Json<Vec<Contact>>> {
    let service = ContactService::new(state.db);
    let contacts = service.list(filter).await?;
    Ok(Json(contacts))
}

/// Get a contact
pub async fn get_contact(
    State(state): State<AppState>,
    Path(contact_id): Path<Uuid>,
) -> AppResult<Json<Contact>> {
    let service = ContactService::new(state.db);
    let contact = service.get(contact_id).await?;
    Ok(Json(contact))
}

/// Update a contact
pub async fn update_contact(
    State(state): State<AppState>,
    Path(contact_id): Path<Uuid>,
    Json(input): Json<UpdateContactInput>,
) -> AppResult<Json<Contact>> {
    let service = ContactService::new(state.db);
    let contact = service.update(contact_id, input).await?;
    Ok(Json(contact))
}

/// Soft delete a contact
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(contact_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = ContactService::new(state.db);
    service.remove(contact_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
