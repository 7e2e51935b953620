use crate::entities::{contacts, prelude::*};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Contacts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Not unique: duplicates are rejected by the service instead.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_contacts_email")
                    .table(Contacts)
                    .col(contacts::Column::Email)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Contacts).to_owned())
            .await?;

        Ok(())
    }
}
