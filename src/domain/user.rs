//! User domain entity and related types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::preferences::Preferences;
use crate::config::{ROLE_ADMIN, ROLE_BUSINESS, ROLE_PERSON, ROLE_SELLER};

/// User roles enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Seller,
    Business,
    Person,
}

impl UserRole {
    /// Admins and sellers manage the catalog
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Seller)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => ROLE_ADMIN,
            UserRole::Seller => ROLE_SELLER,
            UserRole::Business => ROLE_BUSINESS,
            UserRole::Person => ROLE_PERSON,
        }
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => UserRole::Admin,
            ROLE_SELLER => UserRole::Seller,
            ROLE_BUSINESS => UserRole::Business,
            _ => UserRole::Person,
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub nickname: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub pic_url: Option<String>,
    pub language: Option<String>,
    pub time_zone: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub rate_val: Option<i32>,
    pub rate_count: Option<i32>,
    pub preferences: Preferences,
    pub verified: bool,
    #[serde(skip_serializing)]
    pub confirmation_token: Option<String>,
    pub disabled_at: Option<DateTime<Utc>>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft delete timestamp (None = active, Some = deleted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new user with the default role and empty profile
    pub fn new(
        id: Uuid,
        first_name: String,
        last_name: String,
        email: String,
        password_hash: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            first_name,
            last_name,
            nickname: None,
            email,
            password_hash,
            role: UserRole::Person,
            pic_url: None,
            language: None,
            time_zone: None,
            phone_number: None,
            gender: None,
            birthday: None,
            rate_val: None,
            rate_count: None,
            preferences: Preferences::default(),
            verified: false,
            confirmation_token: None,
            disabled_at: None,
            facebook: None,
            twitter: None,
            website: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// "First Last" with the first character upper-cased
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let mut chars = full.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn has_phone(&self) -> bool {
        self.phone_number.is_some()
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == role
    }

    pub fn has_any_role(&self, roles: &[UserRole]) -> bool {
        roles.contains(&self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_at.is_some()
    }
}

/// Profile update payload. Absent fields keep their value; an absent
/// password keeps the stored hash.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub password_hash: Option<String>,
    pub pic_url: Option<String>,
    pub language: Option<String>,
    pub time_zone: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub website: Option<String>,
}

/// Registration data
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub nickname: Option<String>,
    pub email: String,
    pub password_hash: String,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "jane")]
    pub first_name: String,
    #[schema(example = "doe")]
    pub last_name: String,
    #[schema(example = "Jane doe")]
    pub full_name: String,
    pub nickname: Option<String>,
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "person")]
    pub role: String,
    pub pic_url: Option<String>,
    pub language: Option<String>,
    pub time_zone: Option<String>,
    pub phone_number: Option<String>,
    pub has_phone: bool,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub rate_val: Option<i32>,
    pub rate_count: Option<i32>,
    #[schema(value_type = Object)]
    pub preferences: Preferences,
    pub verified: bool,
    pub disabled: bool,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            full_name: user.full_name(),
            has_phone: user.has_phone(),
            disabled: user.is_disabled(),
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            nickname: user.nickname,
            email: user.email,
            role: user.role.to_string(),
            pic_url: user.pic_url,
            language: user.language,
            time_zone: user.time_zone,
            phone_number: user.phone_number,
            gender: user.gender,
            birthday: user.birthday,
            rate_val: user.rate_val,
            rate_count: user.rate_count,
            preferences: user.preferences,
            verified: user.verified,
            facebook: user.facebook,
            twitter: user.twitter,
            website: user.website,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            Uuid::new_v4(),
            "gustavo".to_string(),
            "ocanto".to_string(),
            "gustavo@example.com".to_string(),
            "hashed".to_string(),
        )
    }

    #[test]
    fn test_full_name_capitalizes_first_letter_only() {
        assert_eq!(user().full_name(), "Gustavo ocanto");
    }

    #[test]
    fn test_has_phone() {
        let mut user = user();
        assert!(!user.has_phone());
        user.phone_number = Some("+1 555 0100".to_string());
        assert!(user.has_phone());
    }

    #[test]
    fn test_sellers_count_as_admins() {
        let mut user = user();
        assert!(!user.is_admin());
        user.role = UserRole::Seller;
        assert!(user.is_admin());
        user.role = UserRole::Admin;
        assert!(user.is_admin());
        user.role = UserRole::Business;
        assert!(!user.is_admin());
    }

    #[test]
    fn test_has_role_and_any_role() {
        let user = user();
        assert!(user.has_role(UserRole::Person));
        assert!(!user.has_role(UserRole::Admin));
        assert!(user.has_any_role(&[UserRole::Admin, UserRole::Person]));
        assert!(!user.has_any_role(&[UserRole::Admin, UserRole::Seller]));
    }

    #[test]
    fn test_role_from_str_defaults_to_person() {
        assert_eq!(UserRole::from("seller"), UserRole::Seller);
        assert_eq!(UserRole::from("unknown"), UserRole::Person);
        assert_eq!(UserRole::Business.to_string(), "business");
    }

    #[test]
    fn test_hidden_fields_are_not_serialized() {
        let mut user = user();
        user.confirmation_token = Some("secret".to_string());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("confirmation_token").is_none());
    }
}
