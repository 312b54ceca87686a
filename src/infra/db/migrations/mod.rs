//! Database migrations.
//!
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}

use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users_table;
mod m20240102_000001_create_features_table;
mod m20240103_000001_create_products_table;
mod m20240104_000001_create_notifications_table;
mod m20240105_000001_create_email_change_petitions_table;
mod m20240106_000001_create_password_resets_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240102_000001_create_features_table::Migration),
            Box::new(m20240103_000001_create_products_table::Migration),
            Box::new(m20240104_000001_create_notifications_table::Migration),
            Box::new(m20240105_000001_create_email_change_petitions_table::Migration),
            Box::new(m20240106_000001_create_password_resets_table::Migration),
        ]
    }
}
