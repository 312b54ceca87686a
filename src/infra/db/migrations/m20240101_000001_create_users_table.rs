//! Migration: Create users table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::FirstName).string_len(100).not_null())
                    .col(ColumnDef::new(Users::LastName).string_len(100).not_null())
                    .col(ColumnDef::new(Users::Nickname).string_len(100).null())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(20)
                            .not_null()
                            .default("person"),
                    )
                    .col(ColumnDef::new(Users::PicUrl).string().null())
                    .col(ColumnDef::new(Users::Language).string_len(10).null())
                    .col(ColumnDef::new(Users::TimeZone).string_len(64).null())
                    .col(ColumnDef::new(Users::PhoneNumber).string_len(30).null())
                    .col(ColumnDef::new(Users::Gender).string_len(20).null())
                    .col(ColumnDef::new(Users::Birthday).date().null())
                    .col(ColumnDef::new(Users::RateVal).integer().null())
                    .col(ColumnDef::new(Users::RateCount).integer().null())
                    .col(ColumnDef::new(Users::Preferences).json_binary().null())
                    .col(
                        ColumnDef::new(Users::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::ConfirmationToken).string().null())
                    .col(
                        ColumnDef::new(Users::DisabledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Users::Facebook).string().null())
                    .col(ColumnDef::new(Users::Twitter).string().null())
                    .col(ColumnDef::new(Users::Website).string().null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Most queries filter out soft-deleted rows
        manager
            .create_index(
                Index::create()
                    .name("idx_users_deleted_at")
                    .table(Users::Table)
                    .col(Users::DeletedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(super) enum Users {
    Table,
    Id,
    FirstName,
    LastName,
    Nickname,
    Email,
    PasswordHash,
    Role,
    PicUrl,
    Language,
    TimeZone,
    PhoneNumber,
    Gender,
    Birthday,
    RateVal,
    RateCount,
    Preferences,
    Verified,
    ConfirmationToken,
    DisabledAt,
    Facebook,
    Twitter,
    Website,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
