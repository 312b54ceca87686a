//! User service: profile, preferences, inbox, email changes and the admin
//! account lifecycle.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::notifier::Notifier;
use crate::config::Config;
use crate::domain::{
    generate_token, EmailChangePetition, Notification, OutboundNotification, Password,
    PreferenceKey, Product, ProfileChanges, User, UserRole,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::jobs::EmailQueue;
use crate::types::PaginationParams;

/// User service trait for dependency injection.
///
/// Operations exclude soft-deleted users unless stated otherwise.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    /// Page of active users and the total count
    async fn list_users(&self, params: &PaginationParams) -> AppResult<(Vec<User>, u64)>;

    async fn list_deleted_users(&self) -> AppResult<Vec<User>>;

    /// Update the profile. A missing or blank password keeps the stored one.
    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
        password: Option<String>,
    ) -> AppResult<User>;

    /// Merge `values` into the preference list stored under `key`
    async fn update_preferences(
        &self,
        id: Uuid,
        key: PreferenceKey,
        values: Vec<String>,
    ) -> AppResult<User>;

    async fn notifications(&self, id: Uuid) -> AppResult<Vec<Notification>>;

    /// Mark an unread notification owned by the user as read.
    ///
    /// Returns whether anything changed; missing, foreign or already read
    /// notifications are left alone.
    async fn mark_notification_as_read(&self, id: Uuid, notification_id: Uuid) -> AppResult<bool>;

    async fn products(&self, id: Uuid) -> AppResult<Vec<Product>>;

    async fn email_change_petitions(&self, id: Uuid) -> AppResult<Vec<EmailChangePetition>>;

    /// Open a petition and send the confirmation link to the new address
    async fn request_email_change(&self, id: Uuid, new_email: String) -> AppResult<EmailChangePetition>;

    async fn update_role(&self, id: Uuid, role: UserRole) -> AppResult<User>;

    /// Soft delete. Admins cannot delete themselves.
    async fn delete_user(&self, actor: Uuid, id: Uuid) -> AppResult<()>;

    async fn restore_user(&self, id: Uuid) -> AppResult<User>;

    /// Admins cannot disable themselves.
    async fn disable_user(&self, actor: Uuid, id: Uuid) -> AppResult<User>;

    async fn enable_user(&self, id: Uuid) -> AppResult<User>;
}

pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
    notifier: Notifier<U>,
    email_change_ttl: Duration,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>, queue: Arc<dyn EmailQueue>, config: &Config) -> Self {
        Self {
            notifier: Notifier::new(uow.clone(), queue, config),
            email_change_ttl: Duration::hours(config.email_change_ttl_hours),
            uow,
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.uow.users().find_by_id(id).await?.ok_or_not_found()
    }

    async fn list_users(&self, params: &PaginationParams) -> AppResult<(Vec<User>, u64)> {
        self.uow.users().list(params).await
    }

    async fn list_deleted_users(&self) -> AppResult<Vec<User>> {
        self.uow.users().list_deleted().await
    }

    async fn update_profile(
        &self,
        id: Uuid,
        mut changes: ProfileChanges,
        password: Option<String>,
    ) -> AppResult<User> {
        changes.password_hash = match password.filter(|p| !p.trim().is_empty()) {
            Some(plain) => Some(Password::new(&plain)?.into_string()),
            None => None,
        };

        self.uow.users().update_profile(id, changes).await
    }

    async fn update_preferences(
        &self,
        id: Uuid,
        key: PreferenceKey,
        values: Vec<String>,
    ) -> AppResult<User> {
        let user = self.get_user(id).await?;
        let mut preferences = user.preferences;
        preferences.update(key, values);

        self.uow.users().update_preferences(id, preferences).await
    }

    async fn notifications(&self, id: Uuid) -> AppResult<Vec<Notification>> {
        self.uow.notifications().list_for_user(id).await
    }

    async fn mark_notification_as_read(&self, id: Uuid, notification_id: Uuid) -> AppResult<bool> {
        let notifications = self.uow.notifications();
        match notifications.find_unread_for_user(id, notification_id).await? {
            Some(notification) => {
                notifications.mark_read(notification.id).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn products(&self, id: Uuid) -> AppResult<Vec<Product>> {
        self.uow.products().list_by_user(id).await
    }

    async fn email_change_petitions(&self, id: Uuid) -> AppResult<Vec<EmailChangePetition>> {
        self.uow.email_changes().list_for_user(id).await
    }

    async fn request_email_change(&self, id: Uuid, new_email: String) -> AppResult<EmailChangePetition> {
        let user = self.get_user(id).await?;

        if user.email.eq_ignore_ascii_case(&new_email) {
            return Err(AppError::invalid_field(
                "email",
                "The new email must be different from the current one.",
            ));
        }
        if self
            .uow
            .users()
            .find_by_email_with_deleted(&new_email)
            .await?
            .is_some()
        {
            return Err(AppError::invalid_field("email", "The email has already been taken."));
        }

        let token = generate_token();
        let petition = self
            .uow
            .email_changes()
            .create(
                user.id,
                user.email.clone(),
                new_email.clone(),
                token.clone(),
                Utc::now() + self.email_change_ttl,
            )
            .await?;

        self.notifier
            .notify(&user, OutboundNotification::EmailChange { new_email, token })
            .await?;

        Ok(petition)
    }

    async fn update_role(&self, id: Uuid, role: UserRole) -> AppResult<User> {
        let user = self.uow.users().update_role(id, role).await?;
        tracing::info!(user_id = %id, role = %role, "User role changed");
        Ok(user)
    }

    async fn delete_user(&self, actor: Uuid, id: Uuid) -> AppResult<()> {
        if actor == id {
            return Err(AppError::BadRequest("Cannot delete your own account".to_string()));
        }
        self.uow.users().delete(id).await
    }

    async fn restore_user(&self, id: Uuid) -> AppResult<User> {
        self.uow.users().restore(id).await
    }

    async fn disable_user(&self, actor: Uuid, id: Uuid) -> AppResult<User> {
        if actor == id {
            return Err(AppError::BadRequest("Cannot disable your own account".to_string()));
        }
        self.uow.users().set_disabled(id, true).await
    }

    async fn enable_user(&self, id: Uuid) -> AppResult<User> {
        self.uow.users().set_disabled(id, false).await
    }
}
