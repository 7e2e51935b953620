use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::contacts;

#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    pub id: i32,
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<contacts::Model> for Contact {
    fn from(model: contacts::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            message: model.message,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fields accepted when a contact is created or replaced.
#[derive(Debug, Clone, Default)]
pub struct ContactInput {
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
}

/// A contact matched by a fuzzy name search.
#[derive(Debug, Clone, Serialize)]
pub struct ContactMatch {
    #[serde(flatten)]
    pub contact: Contact,
    pub score: f64,
}
