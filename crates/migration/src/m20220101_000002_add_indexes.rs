use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Listing: newest first within one resource
        manager
            .create_index(
                Index::create()
                    .name("idx_resource_record_listing")
                    .table(ResourceRecord::Table)
                    .col(ResourceRecord::Resource)
                    .col((ResourceRecord::CreatedAt, IndexOrder::Desc))
                    .col(ResourceRecord::Id)
                    .to_owned(),
            )
            .await?;

        // Status filter
        manager
            .create_index(
                Index::create()
                    .name("idx_resource_record_status")
                    .table(ResourceRecord::Table)
                    .col(ResourceRecord::Resource)
                    .col(ResourceRecord::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_resource_record_listing").table(ResourceRecord::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_resource_record_status").table(ResourceRecord::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ResourceRecord { Table, Resource, Status, CreatedAt, Id }
