//! Email change petitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::email_change_petition::{self, ActiveModel, Entity as PetitionEntity};
use crate::domain::EmailChangePetition;
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EmailChangeRepository: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        old_email: String,
        new_email: String,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> AppResult<EmailChangePetition>;

    /// Newest first
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<EmailChangePetition>>;

    async fn find_by_token(&self, token: &str) -> AppResult<Option<EmailChangePetition>>;
}

pub struct EmailChangeStore {
    db: DatabaseConnection,
}

impl EmailChangeStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EmailChangeRepository for EmailChangeStore {
    async fn create(
        &self,
        user_id: Uuid,
        old_email: String,
        new_email: String,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> AppResult<EmailChangePetition> {
        let active = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            old_email: Set(old_email),
            new_email: Set(new_email),
            token: Set(token),
            expires_at: Set(expires_at),
            confirmed: Set(false),
            confirmed_at: Set(None),
            created_at: Set(Utc::now()),
        };

        let model = active.insert(&self.db).await?;
        Ok(EmailChangePetition::from(model))
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<EmailChangePetition>> {
        let models = PetitionEntity::find()
            .filter(email_change_petition::Column::UserId.eq(user_id))
            .order_by_desc(email_change_petition::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(EmailChangePetition::from).collect())
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<EmailChangePetition>> {
        let model = PetitionEntity::find()
            .filter(email_change_petition::Column::Token.eq(token))
            .one(&self.db)
            .await?;

        Ok(model.map(EmailChangePetition::from))
    }
}
