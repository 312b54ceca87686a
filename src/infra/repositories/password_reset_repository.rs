//! Password reset tokens, one per email address.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{sea_query::OnConflict, DatabaseConnection, EntityTrait, Set};

use super::entities::password_reset::{self, ActiveModel, Entity as PasswordResetEntity};
use crate::domain::PasswordReset;
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    /// Store a token hash, replacing any earlier one for the email
    async fn upsert(&self, email: String, token_hash: String) -> AppResult<()>;

    async fn find(&self, email: &str) -> AppResult<Option<PasswordReset>>;
}

pub struct PasswordResetStore {
    db: DatabaseConnection,
}

impl PasswordResetStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PasswordResetRepository for PasswordResetStore {
    async fn upsert(&self, email: String, token_hash: String) -> AppResult<()> {
        let active = ActiveModel {
            email: Set(email),
            token_hash: Set(token_hash),
            created_at: Set(Utc::now()),
        };

        PasswordResetEntity::insert(active)
            .on_conflict(
                OnConflict::column(password_reset::Column::Email)
                    .update_columns([
                        password_reset::Column::TokenHash,
                        password_reset::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }

    async fn find(&self, email: &str) -> AppResult<Option<PasswordReset>> {
        let model = PasswordResetEntity::find_by_id(email.to_string())
            .one(&self.db)
            .await?;

        Ok(model.map(PasswordReset::from))
    }
}
