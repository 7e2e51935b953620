//! Domain service for contact-form submissions.
//!
//! Anyone may submit a contact. Admins manage every contact; a regular user
//! only sees and edits contacts submitted with their own email address.

use crate::models::{Contact, ContactMatch, ContactRequest, CurrentUser, PageRequest, Paged};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Contact not found: {0}")]
    NotFound(i32),

    #[error("You do not have access to this contact")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ContactError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ContactError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ContactError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(crate::validation::describe(&err))
    }
}

#[async_trait::async_trait]
pub trait ContactService: Send + Sync {
    /// Stores a public submission and acknowledges it by email.
    ///
    /// # Errors
    ///
    /// - [`ContactError::Validation`] for malformed fields
    /// - [`ContactError::Conflict`] if another contact already uses the email
    async fn create(&self, request: ContactRequest) -> Result<Contact, ContactError>;

    /// Newest first. Non-admin callers only see their own submissions.
    async fn list(
        &self,
        caller: &CurrentUser,
        page: PageRequest,
    ) -> Result<Paged<Contact>, ContactError>;

    /// # Errors
    ///
    /// - [`ContactError::NotFound`] if the contact does not exist
    /// - [`ContactError::Forbidden`] if the caller does not own it
    async fn get(&self, caller: &CurrentUser, id: i32) -> Result<Contact, ContactError>;

    /// Fuzzy match on contact names, best match first.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::Validation`] for an empty query.
    async fn search_by_name(
        &self,
        caller: &CurrentUser,
        query: &str,
    ) -> Result<Vec<ContactMatch>, ContactError>;

    /// Replaces every field of the contact.
    ///
    /// # Errors
    ///
    /// - [`ContactError::NotFound`] / [`ContactError::Forbidden`] as for `get`
    /// - [`ContactError::Forbidden`] if a non-admin moves it to another email
    /// - [`ContactError::Conflict`] if the new email belongs to another contact
    async fn update(
        &self,
        caller: &CurrentUser,
        id: i32,
        request: ContactRequest,
    ) -> Result<Contact, ContactError>;

    /// Returns the removed contact.
    async fn delete(&self, caller: &CurrentUser, id: i32) -> Result<Contact, ContactError>;
}
