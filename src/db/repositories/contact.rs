use crate::entities::{contacts, prelude::*};
use crate::models::{Contact, ContactInput, PageRequest};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use tracing::info;

/// Repository for contact-form submissions
pub struct ContactRepository {
    conn: DatabaseConnection,
}

impl ContactRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn scoped(owner_email: Option<&str>) -> Select<Contacts> {
        let query = Contacts::find();
        match owner_email {
            Some(email) => query.filter(contacts::Column::Email.eq(email)),
            None => query,
        }
    }

    pub async fn insert(&self, input: &ContactInput) -> Result<Contact> {
        let now = chrono::Utc::now();

        let active_model = contacts::ActiveModel {
            name: Set(input.name.clone()),
            email: Set(input.email.clone()),
            phone: Set(input.phone.clone()),
            message: Set(input.message.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert contact")?;

        info!("Stored contact {} <{}>", model.id, model.email);
        Ok(Contact::from(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<Contact>> {
        let model = Contacts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query contact by ID")?;

        Ok(model.map(Contact::from))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Contact>> {
        let model = Contacts::find()
            .filter(contacts::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query contact by email")?;

        Ok(model.map(Contact::from))
    }

    /// Lists contacts newest first. `owner_email` restricts the result to a
    /// single submitter.
    pub async fn list(
        &self,
        owner_email: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<Contact>, u64)> {
        let paginator = Self::scoped(owner_email)
            .order_by_desc(contacts::Column::CreatedAt)
            .order_by_desc(contacts::Column::Id)
            .paginate(&self.conn, page.page_size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.page.saturating_sub(1)).await?;

        Ok((items.into_iter().map(Contact::from).collect(), total))
    }

    /// Contacts that have a name, used as the candidate set for fuzzy search.
    pub async fn list_named(&self, owner_email: Option<&str>) -> Result<Vec<Contact>> {
        let rows = Self::scoped(owner_email)
            .filter(contacts::Column::Name.is_not_null())
            .order_by_asc(contacts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list named contacts")?;

        Ok(rows.into_iter().map(Contact::from).collect())
    }

    pub async fn update(&self, id: i32, input: &ContactInput) -> Result<Option<Contact>> {
        let Some(model) = Contacts::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: contacts::ActiveModel = model.into();
        active.name = Set(input.name.clone());
        active.email = Set(input.email.clone());
        active.phone = Set(input.phone.clone());
        active.message = Set(input.message.clone());
        active.updated_at = Set(chrono::Utc::now());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update contact")?;

        Ok(Some(Contact::from(updated)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Contacts::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Contacts::find().count(&self.conn).await?)
    }
}
