//! Outbound user notifications: an inbox record plus a queued email.

use std::sync::Arc;

use crate::config::Config;
use crate::domain::{OutboundNotification, User};
use crate::errors::AppResult;
use crate::infra::UnitOfWork;
use crate::jobs::{EmailJob, EmailQueue};

pub struct Notifier<U: UnitOfWork> {
    uow: Arc<U>,
    queue: Arc<dyn EmailQueue>,
    app_url: String,
    mail_from: String,
}

impl<U: UnitOfWork> Notifier<U> {
    pub fn new(uow: Arc<U>, queue: Arc<dyn EmailQueue>, config: &Config) -> Self {
        Self {
            uow,
            queue,
            app_url: config.app_url.clone(),
            mail_from: config.mail_from.clone(),
        }
    }

    /// Record `notification` in the user's inbox and queue its email.
    pub async fn notify(&self, user: &User, notification: OutboundNotification) -> AppResult<()> {
        self.uow
            .notifications()
            .create(user.id, notification.kind().to_string(), notification.data())
            .await?;

        let job = EmailJob::for_notification(
            &self.mail_from,
            notification.recipient(&user.email),
            &notification,
            &self.app_url,
        );
        self.queue.enqueue(job).await?;

        tracing::info!(user_id = %user.id, kind = notification.kind(), "Notification sent");
        Ok(())
    }

    pub async fn send_password_reset_notification(&self, user: &User, token: &str) -> AppResult<()> {
        self.notify(
            user,
            OutboundNotification::ResetPassword {
                token: token.to_string(),
            },
        )
        .await
    }
}
