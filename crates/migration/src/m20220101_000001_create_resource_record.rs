//! Create `resource_record` table.
//! One row per record of any resource; business fields live in a JSONB column.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ResourceRecord::Table)
                    .if_not_exists()
                    .col(uuid(ResourceRecord::Id).primary_key())
                    .col(string_len(ResourceRecord::Resource, 64).not_null())
                    .col(string_len(ResourceRecord::Status, 64).not_null())
                    .col(json_binary(ResourceRecord::Fields).not_null())
                    .col(timestamp_with_time_zone(ResourceRecord::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ResourceRecord::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ResourceRecord::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ResourceRecord {
    Table,
    Id,
    Resource,
    Status,
    Fields,
    CreatedAt,
    UpdatedAt,
}
