//! Email background job.
//!
//! Services push [`EmailJob`]s through an [`EmailQueue`]; the `jobs work`
//! worker consumes them from the apalis Postgres storage. Delivery is logged
//! rather than sent over SMTP.

use apalis::prelude::Storage;
use apalis_sql::postgres::PostgresStorage;
use apalis_sql::sqlx::postgres::PgPoolOptions;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::JOB_NAME_EMAIL;
use crate::domain::OutboundNotification;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Email job payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailJob {
    pub from: String,
    pub to: String,
    pub subject: String,
    /// Plain text body
    pub body: String,
}

impl EmailJob {
    /// Render a notification sent by `from` to `recipient`, with links
    /// rooted at `app_url`.
    pub fn for_notification(
        from: &str,
        recipient: &str,
        notification: &OutboundNotification,
        app_url: &str,
    ) -> Self {
        Self {
            from: from.to_string(),
            to: recipient.to_string(),
            subject: notification.subject().to_string(),
            body: notification.body(app_url),
        }
    }
}

/// Outbound email queue.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EmailQueue: Send + Sync {
    async fn enqueue(&self, job: EmailJob) -> AppResult<()>;
}

/// Queue backed by the apalis Postgres job storage.
pub struct PostgresEmailQueue {
    storage: PostgresStorage<EmailJob>,
}

impl PostgresEmailQueue {
    pub fn new(storage: PostgresStorage<EmailJob>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl EmailQueue for PostgresEmailQueue {
    async fn enqueue(&self, job: EmailJob) -> AppResult<()> {
        let mut storage = self.storage.clone();
        storage
            .push(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to queue email: {}", e)))?;
        Ok(())
    }
}

/// Connect to the job database, create the apalis tables when missing and
/// open the email job storage (jobs are namespaced under `JOB_NAME_EMAIL`).
pub async fn connect_email_storage(database_url: &str) -> AppResult<PostgresStorage<EmailJob>> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect to job database: {}", e)))?;

    PostgresStorage::setup(&pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to setup job storage: {}", e)))?;

    Ok(PostgresStorage::new_with_config(
        pool,
        apalis_sql::Config::new(JOB_NAME_EMAIL),
    ))
}

/// Process one email job.
pub async fn email_job_handler(job: EmailJob) -> Result<(), AppError> {
    tracing::info!(
        to = %job.to,
        from = %job.from,
        subject = %job.subject,
        "Processing email job"
    );
    tracing::debug!(body = %job.body, "Email body");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_for_email_change_goes_to_new_address() {
        let notification = OutboundNotification::EmailChange {
            new_email: "new@example.com".to_string(),
            token: "tok".to_string(),
        };

        let job = EmailJob::for_notification(
            "shop@example.com",
            notification.recipient("old@example.com"),
            &notification,
            "https://shop.test",
        );

        assert_eq!(job.to, "new@example.com");
        assert!(job.body.contains("https://shop.test/user/email/confirm/tok"));
        assert_eq!(job.from, "shop@example.com");
    }

    #[tokio::test]
    async fn test_handler_accepts_job() {
        let job = EmailJob {
            from: "shop@example.com".to_string(),
            to: "a@example.com".to_string(),
            subject: "Hi".to_string(),
            body: "Body".to_string(),
        };
        assert!(email_job_handler(job).await.is_ok());
    }
}
