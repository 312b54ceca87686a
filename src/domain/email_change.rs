//! Email change petitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A pending request to move an account to a new email address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmailChangePetition {
    pub id: Uuid,
    pub user_id: Uuid,
    pub old_email: String,
    pub new_email: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub confirmed: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl EmailChangePetition {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Can still be confirmed at `now`
    pub fn is_pending(&self, now: DateTime<Utc>) -> bool {
        !self.confirmed && !self.is_expired(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn petition(expires_in: Duration, confirmed: bool) -> EmailChangePetition {
        let now = Utc::now();
        EmailChangePetition {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            old_email: "old@example.com".to_string(),
            new_email: "new@example.com".to_string(),
            token: "token".to_string(),
            expires_at: now + expires_in,
            confirmed,
            confirmed_at: None,
            created_at: now,
        }
    }

    #[test]
    fn test_pending_until_expiry() {
        let now = Utc::now();
        assert!(petition(Duration::hours(1), false).is_pending(now));
        assert!(!petition(Duration::hours(-1), false).is_pending(now));
    }

    #[test]
    fn test_confirmed_is_not_pending() {
        assert!(!petition(Duration::hours(1), true).is_pending(Utc::now()));
    }
}
