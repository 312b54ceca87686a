//! User notification inbox.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::Value;
use uuid::Uuid;

use super::entities::notification::{self, ActiveModel, Entity as NotificationEntity};
use crate::domain::Notification;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, kind: String, data: Value) -> AppResult<Notification>;

    /// Newest first
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Notification>>;

    /// The notification when it belongs to `user_id` and is still unread
    async fn find_unread_for_user(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<Notification>>;

    async fn mark_read(&self, id: Uuid) -> AppResult<Notification>;
}

pub struct NotificationStore {
    db: DatabaseConnection,
}

impl NotificationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for NotificationStore {
    async fn create(&self, user_id: Uuid, kind: String, data: Value) -> AppResult<Notification> {
        let active = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            kind: Set(kind),
            data: Set(data),
            read_at: Set(None),
            created_at: Set(Utc::now()),
        };

        let model = active.insert(&self.db).await?;
        Ok(Notification::from(model))
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        let models = NotificationEntity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Notification::from).collect())
    }

    async fn find_unread_for_user(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<Notification>> {
        let model = NotificationEntity::find_by_id(id)
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::ReadAt.is_null())
            .one(&self.db)
            .await?;

        Ok(model.map(Notification::from))
    }

    async fn mark_read(&self, id: Uuid) -> AppResult<Notification> {
        let model = NotificationEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = model.into();
        active.read_at = Set(Some(Utc::now()));

        let model = active.update(&self.db).await?;
        Ok(Notification::from(model))
    }
}
