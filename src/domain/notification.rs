//! Stored user notifications and outbound notification messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{NOTIFICATION_EMAIL_CHANGE, NOTIFICATION_RESET_PASSWORD};

/// A notification kept in the user's inbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(example = "reset_password")]
    pub kind: String,
    #[schema(value_type = Object)]
    pub data: Value,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// Messages the application sends to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundNotification {
    /// Carries the plain reset token; only its hash is persisted.
    ResetPassword { token: String },
    /// Sent to the requested address of an email change petition.
    EmailChange { new_email: String, token: String },
}

impl OutboundNotification {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundNotification::ResetPassword { .. } => NOTIFICATION_RESET_PASSWORD,
            OutboundNotification::EmailChange { .. } => NOTIFICATION_EMAIL_CHANGE,
        }
    }

    /// Address the email goes to, given the user's current address
    pub fn recipient<'a>(&'a self, user_email: &'a str) -> &'a str {
        match self {
            OutboundNotification::ResetPassword { .. } => user_email,
            OutboundNotification::EmailChange { new_email, .. } => new_email,
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            OutboundNotification::ResetPassword { .. } => "Reset Password Notification",
            OutboundNotification::EmailChange { .. } => "Confirm your new email address",
        }
    }

    /// Link the user follows to act on the notification
    pub fn action_url(&self, app_url: &str) -> String {
        match self {
            OutboundNotification::ResetPassword { token } => {
                format!("{}/password/reset/{}", app_url, token)
            }
            OutboundNotification::EmailChange { token, .. } => {
                format!("{}/user/email/confirm/{}", app_url, token)
            }
        }
    }

    pub fn body(&self, app_url: &str) -> String {
        let url = self.action_url(app_url);
        match self {
            OutboundNotification::ResetPassword { .. } => format!(
                "You are receiving this email because we received a password reset request \
                 for your account.\n\nReset Password: {}\n\n\
                 If you did not request a password reset, no further action is required.",
                url
            ),
            OutboundNotification::EmailChange { new_email, .. } => format!(
                "Please confirm {} as the new email address of your account.\n\n\
                 Confirm: {}\n\n\
                 If you did not request this change, you can ignore this email.",
                new_email, url
            ),
        }
    }

    /// Data stored with the inbox record. Secrets are never stored.
    pub fn data(&self) -> Value {
        match self {
            OutboundNotification::ResetPassword { .. } => {
                json!({ "message": "A password reset link was sent to your email." })
            }
            OutboundNotification::EmailChange { new_email, .. } => json!({
                "message": "Confirm your new email address to finish the change.",
                "new_email": new_email,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_password_goes_to_current_address() {
        let notification = OutboundNotification::ResetPassword {
            token: "abc".to_string(),
        };
        assert_eq!(notification.recipient("me@example.com"), "me@example.com");
        assert_eq!(
            notification.action_url("https://shop.test"),
            "https://shop.test/password/reset/abc"
        );
        assert!(notification.body("https://shop.test").contains("/password/reset/abc"));
    }

    #[test]
    fn test_stored_data_does_not_leak_tokens() {
        let notification = OutboundNotification::EmailChange {
            new_email: "new@example.com".to_string(),
            token: "secret-token".to_string(),
        };
        assert_eq!(notification.recipient("old@example.com"), "new@example.com");
        assert!(!notification.data().to_string().contains("secret-token"));
    }
}
