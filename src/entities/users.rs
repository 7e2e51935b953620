use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2id password hash
    pub password_hash: String,

    #[sea_orm(unique)]
    pub email: String,

    /// One of `SuperUser`, `Admin`, `User`
    pub role: String,

    /// Most recently issued access token; bearer tokens that don't match are rejected.
    pub access_token: Option<String>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::refresh_tokens::Entity")]
    RefreshToken,

    #[sea_orm(has_one = "super::forgot_password_tokens::Entity")]
    ForgotPasswordToken,
}

impl Related<super::refresh_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RefreshToken.def()
    }
}

impl Related<super::forgot_password_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ForgotPasswordToken.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
