//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::domain::{User, UserRole};
use crate::errors::AppError;
use crate::services::Actor;

/// Authenticated user, as currently stored
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role.to_string(),
        }
    }
}

impl CurrentUser {
    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }

    /// Admins and sellers
    pub fn is_admin(&self) -> bool {
        self.role().is_admin()
    }

    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            is_admin: self.is_admin(),
        }
    }
}

/// Validates the bearer token, loads its account and stores the
/// `CurrentUser` in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .ok_or(AppError::Unauthorized)?;

    let user = state.auth_service.authenticate(token).await?;

    request.extensions_mut().insert(CurrentUser::from(user));

    Ok(next.run(request).await)
}

/// Forbidden unless the user is an admin or seller.
pub fn require_admin(user: &CurrentUser) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Forbidden unless the user is `id` or an admin.
pub fn require_self_or_admin(user: &CurrentUser, id: Uuid) -> Result<(), AppError> {
    if user.id == id {
        Ok(())
    } else {
        require_admin(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "me@example.com".to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn test_sellers_pass_the_admin_guard() {
        assert!(require_admin(&user("admin")).is_ok());
        assert!(require_admin(&user("seller")).is_ok());
        assert!(matches!(require_admin(&user("person")), Err(AppError::Forbidden)));
    }

    #[test]
    fn test_self_or_admin() {
        let person = user("business");
        assert!(require_self_or_admin(&person, person.id).is_ok());
        assert!(require_self_or_admin(&person, Uuid::new_v4()).is_err());
        assert!(require_self_or_admin(&user("admin"), Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_current_user_uses_stored_role() {
        let mut stored = User::new(
            Uuid::new_v4(),
            "jane".to_string(),
            "doe".to_string(),
            "jane@example.com".to_string(),
            "hashed".to_string(),
        );
        stored.role = UserRole::Person;

        let current = CurrentUser::from(stored);

        assert_eq!(current.role(), UserRole::Person);
        assert!(matches!(require_admin(&current), Err(AppError::Forbidden)));
    }

    #[test]
    fn test_actor_carries_admin_flag() {
        let seller = user("seller");
        assert_eq!(
            seller.actor(),
            Actor {
                id: seller.id,
                is_admin: true
            }
        );
    }
}
