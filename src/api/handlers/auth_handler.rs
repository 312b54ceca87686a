//! Authentication handlers: accounts, tokens, password reset and email
//! change confirmation.

use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::UserResponse;
use crate::errors::AppResult;
use crate::services::{Registration, TokenResponse};
use crate::types::MessageResponse;

/// User registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "The first name field is required."))]
    #[schema(example = "Jane")]
    pub first_name: String,
    #[validate(length(min = 1, max = 255, message = "The last name field is required."))]
    #[schema(example = "Doe")]
    pub last_name: String,
    #[validate(length(max = 255))]
    pub nickname: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
}

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    /// Token from the reset link
    #[validate(length(min = 1, message = "The token field is required."))]
    pub token: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "The password confirmation does not match."))]
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ConfirmEmailRequest {
    /// Token from the confirmation link
    #[validate(length(min = 1, message = "The token field is required."))]
    pub token: String,
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/password/forgot", post(forgot_password))
        .route("/password/reset", post(reset_password))
        .route("/email-change/confirm", post(confirm_email_change))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 409, description = "User already exists"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .auth_service
        .register(Registration {
            first_name: payload.first_name,
            last_name: payload.last_name,
            nickname: payload.nickname,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Login and get JWT token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account disabled"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state
        .auth_service
        .login(payload.email, payload.password)
        .await?;

    Ok(Json(token))
}

/// Email a password reset link. The answer is the same whether or not the
/// address has an account.
#[utoipa::path(
    post,
    path = "/auth/password/forgot",
    tag = "Authentication",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent when the account exists", body = MessageResponse),
        (status = 422, description = "Validation error")
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.auth_service.forgot_password(payload.email).await?;

    Ok(Json(MessageResponse::new(
        "We have emailed your password reset link.",
    )))
}

#[utoipa::path(
    post,
    path = "/auth/password/reset",
    tag = "Authentication",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 422, description = "Invalid token or validation error")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .auth_service
        .reset_password(payload.email, payload.token, payload.password)
        .await?;

    Ok(Json(MessageResponse::new("Your password has been reset.")))
}

#[utoipa::path(
    post,
    path = "/auth/email-change/confirm",
    tag = "Authentication",
    request_body = ConfirmEmailRequest,
    responses(
        (status = 200, description = "Email changed", body = UserResponse),
        (status = 409, description = "Email already taken"),
        (status = 422, description = "Invalid or expired token")
    )
)]
pub async fn confirm_email_change(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ConfirmEmailRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state.auth_service.confirm_email_change(payload.token).await?;
    Ok(Json(UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_requires_matching_confirmation() {
        let request = ResetPasswordRequest {
            email: "me@example.com".to_string(),
            token: "abc".to_string(),
            password: "long-enough".to_string(),
            password_confirmation: "different!".to_string(),
        };

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password_confirmation"));
    }

    #[test]
    fn test_register_requires_names() {
        let request = RegisterRequest {
            first_name: String::new(),
            last_name: "Doe".to_string(),
            nickname: None,
            email: "jane@example.com".to_string(),
            password: "SecurePass123!".to_string(),
        };

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("first_name"));
    }
}
