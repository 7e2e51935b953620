//! `SeaORM` implementation of the `ContactService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::db::Store;
use crate::models::{
    Contact, ContactInput, ContactMatch, ContactRequest, CurrentUser, PageRequest, Paged,
};
use crate::services::contact_service::{ContactError, ContactService};
use crate::services::email_service::EmailService;
use crate::services::similarity::rank_by_name;
use crate::validation::normalize_email;

pub struct SeaOrmContactService {
    store: Store,
    email: Arc<EmailService>,
    similarity_threshold: f64,
}

impl SeaOrmContactService {
    #[must_use]
    pub const fn new(store: Store, email: Arc<EmailService>, similarity_threshold: f64) -> Self {
        Self {
            store,
            email,
            similarity_threshold,
        }
    }

    fn to_input(request: ContactRequest) -> Result<ContactInput, ContactError> {
        request.validate()?;

        Ok(ContactInput {
            name: non_blank(request.name),
            email: normalize_email(&request.email),
            phone: non_blank(request.phone),
            message: non_blank(request.message),
        })
    }

    async fn ensure_email_free(&self, email: &str, except_id: Option<i32>) -> Result<(), ContactError> {
        match self.store.contact_repo().find_by_email(email).await? {
            Some(existing) if Some(existing.id) != except_id => Err(ContactError::Conflict(
                format!("A contact with email {email} already exists"),
            )),
            _ => Ok(()),
        }
    }

    async fn owned(&self, caller: &CurrentUser, id: i32) -> Result<Contact, ContactError> {
        let contact = self
            .store
            .contact_repo()
            .get(id)
            .await?
            .ok_or(ContactError::NotFound(id))?;

        if caller.owns_email(&contact.email) {
            Ok(contact)
        } else {
            Err(ContactError::Forbidden)
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn owner_scope(caller: &CurrentUser) -> Option<String> {
    (!caller.is_admin()).then(|| normalize_email(&caller.email))
}

#[async_trait]
impl ContactService for SeaOrmContactService {
    async fn create(&self, request: ContactRequest) -> Result<Contact, ContactError> {
        let input = Self::to_input(request)?;
        self.ensure_email_free(&input.email, None).await?;

        let contact = self.store.contact_repo().insert(&input).await?;
        self.email.contact_created(&contact).await;

        Ok(contact)
    }

    async fn list(
        &self,
        caller: &CurrentUser,
        page: PageRequest,
    ) -> Result<Paged<Contact>, ContactError> {
        let scope = owner_scope(caller);
        let (items, total) = self
            .store
            .contact_repo()
            .list(scope.as_deref(), page)
            .await?;

        Ok(Paged::new(items, page, total))
    }

    async fn get(&self, caller: &CurrentUser, id: i32) -> Result<Contact, ContactError> {
        self.owned(caller, id).await
    }

    async fn search_by_name(
        &self,
        caller: &CurrentUser,
        query: &str,
    ) -> Result<Vec<ContactMatch>, ContactError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ContactError::Validation(
                "name: search query cannot be empty".to_string(),
            ));
        }

        let scope = owner_scope(caller);
        let candidates = self.store.contact_repo().list_named(scope.as_deref()).await?;

        let matches: Vec<ContactMatch> = rank_by_name(
            query,
            candidates,
            |c| c.name.as_deref(),
            self.similarity_threshold,
        )
        .into_iter()
        .map(|(contact, score)| ContactMatch { contact, score })
        .collect();

        info!(query, hits = matches.len(), "Contact name search");
        Ok(matches)
    }

    async fn update(
        &self,
        caller: &CurrentUser,
        id: i32,
        request: ContactRequest,
    ) -> Result<Contact, ContactError> {
        let existing = self.owned(caller, id).await?;
        let input = Self::to_input(request)?;

        if input.email != existing.email {
            if !caller.owns_email(&input.email) {
                return Err(ContactError::Forbidden);
            }
            self.ensure_email_free(&input.email, Some(id)).await?;
        }

        let contact = self
            .store
            .contact_repo()
            .update(id, &input)
            .await?
            .ok_or(ContactError::NotFound(id))?;

        self.email.contact_updated(&contact).await;
        Ok(contact)
    }

    async fn delete(&self, caller: &CurrentUser, id: i32) -> Result<Contact, ContactError> {
        let contact = self.owned(caller, id).await?;

        if !self.store.contact_repo().delete(id).await? {
            return Err(ContactError::NotFound(id));
        }

        info!(id, by = %caller.username, "Deleted contact");
        self.email.contact_deleted(&contact).await;
        Ok(contact)
    }
}
