//! Migration: Create features table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Features::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Features::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Features::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Features::InputType)
                            .string_len(20)
                            .not_null()
                            .default("text"),
                    )
                    .col(
                        ColumnDef::new(Features::ProductType)
                            .string_len(20)
                            .not_null()
                            .default("item"),
                    )
                    .col(ColumnDef::new(Features::HelpMessage).string().null())
                    .col(
                        ColumnDef::new(Features::Status)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Features::Filterable)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Features::ValidationRules).text().null())
                    .col(
                        ColumnDef::new(Features::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Features::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_features_filterable")
                    .table(Features::Table)
                    .col(Features::Status)
                    .col(Features::Filterable)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Features::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Features {
    Table,
    Id,
    Name,
    InputType,
    ProductType,
    HelpMessage,
    Status,
    Filterable,
    ValidationRules,
    CreatedAt,
    UpdatedAt,
}
