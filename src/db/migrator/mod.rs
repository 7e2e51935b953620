use sea_orm_migration::prelude::*;

mod m20250301_create_contacts;
mod m20250301_create_users;

/// Schema for the users context: accounts and their owned tokens.
pub struct UsersMigrator;

#[async_trait::async_trait]
impl MigratorTrait for UsersMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250301_create_users::Migration)]
    }
}

/// Schema for the contacts context.
pub struct ContactsMigrator;

#[async_trait::async_trait]
impl MigratorTrait for ContactsMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250301_create_contacts::Migration)]
    }
}
