//! Authentication service: registration, login, JWT handling, password
//! reset and email change confirmation.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::notifier::Notifier;
use crate::config::{Config, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::{generate_token, NewUser, Password, User};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;
use crate::jobs::EmailQueue;

/// Fails every verification; keeps login timing independent of whether the
/// email exists.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dummysalt123456$dummyhash1234567890123456789012";

const INVALID_RESET_TOKEN: &str = "This password reset token is invalid.";
const INVALID_EMAIL_TOKEN: &str = "This email confirmation link is invalid or has expired.";

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Seconds until the token expires
    #[schema(example = 86400)]
    pub expires_in: i64,
}

/// Registration data; the password is still plain text here.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub nickname: Option<String>,
    pub email: String,
    pub password: String,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, registration: Registration) -> AppResult<User>;

    /// Verify credentials and issue a JWT. Disabled accounts are refused.
    async fn login(&self, email: String, password: String) -> AppResult<TokenResponse>;

    fn verify_token(&self, token: &str) -> AppResult<Claims>;

    /// Verify `token` and load its account. Deleted accounts are
    /// unauthorized and disabled ones forbidden; the stored role wins over
    /// the role in the token.
    async fn authenticate(&self, token: &str) -> AppResult<User>;

    /// Issue a reset token and notify the account owner. Unknown emails are
    /// accepted silently.
    async fn forgot_password(&self, email: String) -> AppResult<()>;

    /// Consume a reset token and store the new password.
    async fn reset_password(&self, email: String, token: String, password: String) -> AppResult<()>;

    /// Confirm an email change petition by its token.
    async fn confirm_email_change(&self, token: String) -> AppResult<User>;
}

fn issue_token(user: &User, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse {
        access_token: token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
    })
}

pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    notifier: Notifier<U>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, queue: Arc<dyn EmailQueue>, config: Config) -> Self {
        let notifier = Notifier::new(uow.clone(), queue, &config);
        Self {
            uow,
            notifier,
            config,
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(&self, registration: Registration) -> AppResult<User> {
        // Soft-deleted accounts keep their email reserved
        if self
            .uow
            .users()
            .find_by_email_with_deleted(&registration.email)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("User"));
        }

        let password_hash = Password::new(&registration.password)?.into_string();
        let user = self
            .uow
            .users()
            .create(NewUser {
                first_name: registration.first_name,
                last_name: registration.last_name,
                nickname: registration.nickname,
                email: registration.email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    async fn login(&self, email: String, password: String) -> AppResult<TokenResponse> {
        let user = self.uow.users().find_by_email(&email).await?;

        let hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| DUMMY_HASH.to_string());
        let password_valid = Password::from_hash(hash).verify(&password);

        let user = match user {
            Some(user) if password_valid => user,
            _ => return Err(AppError::InvalidCredentials),
        };

        if user.is_disabled() {
            tracing::warn!(user_id = %user.id, "Login refused for disabled account");
            return Err(AppError::AccountDisabled);
        }

        issue_token(&user, &self.config)
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    async fn authenticate(&self, token: &str) -> AppResult<User> {
        let claims = self.verify_token(token)?;

        let user = self
            .uow
            .users()
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if user.is_disabled() {
            tracing::debug!(user_id = %user.id, "Token presented for disabled account");
            return Err(AppError::AccountDisabled);
        }

        Ok(user)
    }

    async fn forgot_password(&self, email: String) -> AppResult<()> {
        let Some(user) = self.uow.users().find_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = generate_token();
        let token_hash = Password::new(&token)?.into_string();
        self.uow
            .password_resets()
            .upsert(user.email.clone(), token_hash)
            .await?;

        self.notifier
            .send_password_reset_notification(&user, &token)
            .await
    }

    async fn reset_password(&self, email: String, token: String, password: String) -> AppResult<()> {
        let password_hash = Password::new(&password)?.into_string();
        let ttl = Duration::minutes(self.config.password_reset_ttl_minutes);

        let reset = self.uow.password_resets().find(&email).await?;
        if !reset.is_some_and(|r| r.accepts(&token, ttl, Utc::now())) {
            return Err(AppError::invalid_field("token", INVALID_RESET_TOKEN));
        }

        let user = self
            .uow
            .users()
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::invalid_field("email", INVALID_RESET_TOKEN))?;

        let user_id = user.id;
        crate::with_transaction!(self.uow, |ctx| {
            ctx.users().update_password(user_id, password_hash).await?;
            ctx.password_resets().delete(&email).await
        })?;

        tracing::info!(user_id = %user_id, "Password reset");
        Ok(())
    }

    async fn confirm_email_change(&self, token: String) -> AppResult<User> {
        // Serializable: the new address must still be free when it is claimed
        let user = crate::with_transaction!(self.uow, serializable, |ctx| {
            let petition = ctx
                .email_changes()
                .find_by_token(&token)
                .await?
                .filter(|p| p.is_pending(Utc::now()))
                .ok_or_else(|| AppError::invalid_field("token", INVALID_EMAIL_TOKEN))?;

            let holder = ctx
                .users()
                .find_by_email_with_deleted(&petition.new_email)
                .await?;
            if holder.is_some_and(|u| u.id != petition.user_id) {
                return Err(AppError::conflict("Email"));
            }

            let user = ctx
                .users()
                .update_email(petition.user_id, petition.new_email.clone())
                .await?;
            ctx.email_changes().mark_confirmed(petition.id).await?;
            Ok(user)
        })?;

        tracing::info!(user_id = %user.id, "Email change confirmed");
        Ok(user)
    }
}
