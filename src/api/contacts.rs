use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::validation::{NameQuery, PageQuery, validate_id, validate_page, validate_search_query};
use super::{ApiError, ApiResponse, AppState};
use crate::models::{Contact, ContactMatch, ContactRequest, CurrentUser, Paged};

/// POST /contacts
/// Public contact form submission
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ContactRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Contact>>), ApiError> {
    let contact = state.contact_service().create(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(contact, "Contact created")),
    ))
}

/// GET /contacts
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<ApiResponse<Paged<Contact>>>, ApiError> {
    let page = validate_page(&query)?;
    let contacts = state.contact_service().list(&caller, page).await?;
    Ok(Json(ApiResponse::success(contacts, "Contacts retrieved")))
}

/// GET /contacts/search?name=
pub async fn search_contacts(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<NameQuery>,
) -> Result<Json<ApiResponse<Vec<ContactMatch>>>, ApiError> {
    let name = validate_search_query(&query.name)?;
    let matches = state
        .contact_service()
        .search_by_name(&caller, name)
        .await?;

    let message = format!("Found {} matching contact(s)", matches.len());
    Ok(Json(ApiResponse::success(matches, message)))
}

/// GET /contacts/{id}
pub async fn get_contact(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<Contact>>, ApiError> {
    let id = validate_id("contact", id)?;
    let contact = state.contact_service().get(&caller, id).await?;
    Ok(Json(ApiResponse::success(contact, "Contact retrieved")))
}

/// PUT /contacts/{id}
pub async fn update_contact(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ContactRequest>,
) -> Result<Json<ApiResponse<Contact>>, ApiError> {
    let id = validate_id("contact", id)?;
    let contact = state
        .contact_service()
        .update(&caller, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(contact, "Contact updated")))
}

/// DELETE /contacts/{id}
pub async fn delete_contact(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<Contact>>, ApiError> {
    let id = validate_id("contact", id)?;
    let contact = state.contact_service().delete(&caller, id).await?;
    Ok(Json(ApiResponse::success(contact, "Contact deleted")))
}
