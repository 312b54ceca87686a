//! User repository with soft delete support.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use super::base::fetch_page;
use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{NewUser, Preferences, ProfileChanges, User, UserRole};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Query methods exclude soft-deleted records unless the name says otherwise.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Emails stay reserved by soft-deleted accounts
    async fn find_by_email_with_deleted(&self, email: &str) -> AppResult<Option<User>>;

    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// Apply profile changes; `None` fields keep their stored value
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> AppResult<User>;

    async fn update_role(&self, id: Uuid, role: UserRole) -> AppResult<User>;

    async fn update_preferences(&self, id: Uuid, preferences: Preferences) -> AppResult<User>;

    /// Set or clear `disabled_at`
    async fn set_disabled(&self, id: Uuid, disabled: bool) -> AppResult<User>;

    /// Soft delete (sets deleted_at)
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    async fn restore(&self, id: Uuid) -> AppResult<User>;

    /// Page of active users, newest first, with the total count
    async fn list(&self, params: &PaginationParams) -> AppResult<(Vec<User>, u64)>;

    async fn list_deleted(&self) -> AppResult<Vec<User>>;
}

pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Load an active user as an active model ready for changes
    async fn editable(&self, id: Uuid) -> AppResult<ActiveModel> {
        let model = UserEntity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(model.into())
    }

    async fn save(&self, mut active: ActiveModel) -> AppResult<User> {
        active.updated_at = Set(Utc::now());
        let model = active.update(&self.db).await?;
        Ok(User::from(model))
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;

        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;

        Ok(result.map(User::from))
    }

    async fn find_by_email_with_deleted(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(result.map(User::from))
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            first_name: Set(user.first_name),
            last_name: Set(user.last_name),
            nickname: Set(user.nickname),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            role: Set(UserRole::Person.as_str().to_string()),
            pic_url: Set(None),
            language: Set(None),
            time_zone: Set(None),
            phone_number: Set(None),
            gender: Set(None),
            birthday: Set(None),
            rate_val: Set(None),
            rate_count: Set(None),
            preferences: Set(Some(Preferences::default().to_value())),
            verified: Set(false),
            confirmation_token: Set(None),
            disabled_at: Set(None),
            facebook: Set(None),
            twitter: Set(None),
            website: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(User::from(model))
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> AppResult<User> {
        let mut active = self.editable(id).await?;

        if let Some(first_name) = changes.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = changes.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(password_hash) = changes.password_hash {
            active.password_hash = Set(password_hash);
        }

        let optional = [
            (changes.nickname, &mut active.nickname),
            (changes.pic_url, &mut active.pic_url),
            (changes.language, &mut active.language),
            (changes.time_zone, &mut active.time_zone),
            (changes.phone_number, &mut active.phone_number),
            (changes.gender, &mut active.gender),
            (changes.facebook, &mut active.facebook),
            (changes.twitter, &mut active.twitter),
            (changes.website, &mut active.website),
        ];
        for (value, column) in optional {
            if let Some(value) = value {
                *column = Set(Some(value));
            }
        }
        if let Some(birthday) = changes.birthday {
            active.birthday = Set(Some(birthday));
        }

        self.save(active).await
    }

    async fn update_role(&self, id: Uuid, role: UserRole) -> AppResult<User> {
        let mut active = self.editable(id).await?;
        active.role = Set(role.as_str().to_string());
        self.save(active).await
    }

    async fn update_preferences(&self, id: Uuid, preferences: Preferences) -> AppResult<User> {
        let mut active = self.editable(id).await?;
        active.preferences = Set(Some(preferences.to_value()));
        self.save(active).await
    }

    async fn set_disabled(&self, id: Uuid, disabled: bool) -> AppResult<User> {
        let mut active = self.editable(id).await?;
        active.disabled_at = Set(disabled.then(Utc::now));
        self.save(active).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut active = self.editable(id).await?;
        active.deleted_at = Set(Some(Utc::now()));
        self.save(active).await?;
        Ok(())
    }

    async fn restore(&self, id: Uuid) -> AppResult<User> {
        let user = UserEntity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_not_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::validation("User is not deleted or does not exist"))?;

        let mut active: ActiveModel = user.into();
        active.deleted_at = Set(None);
        self.save(active).await
    }

    async fn list(&self, params: &PaginationParams) -> AppResult<(Vec<User>, u64)> {
        let query = UserEntity::find()
            .filter(user::Column::DeletedAt.is_null())
            .order_by_desc(user::Column::CreatedAt);
        let (models, total) = fetch_page(query, &self.db, params).await?;

        Ok((models.into_iter().map(User::from).collect(), total))
    }

    async fn list_deleted(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .filter(user::Column::DeletedAt.is_not_null())
            .order_by_desc(user::Column::DeletedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(User::from).collect())
    }
}
