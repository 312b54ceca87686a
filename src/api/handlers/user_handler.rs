//! User handlers: the caller's own account under `/users/me` and admin
//! account management.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, require_self_or_admin, CurrentUser};
use crate::api::AppState;
use crate::config::is_valid_role;
use crate::domain::{
    EmailChangePetition, Notification, PreferenceKey, Product, ProfileChanges, UserResponse,
    UserRole,
};
use crate::errors::{AppError, AppResult};
use crate::types::{NoContent, Paginated, PaginationParams};

/// Profile update form. Absent fields keep their value; an empty password
/// keeps the current one.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 255, message = "The first name field is required."))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 255, message = "The last name field is required."))]
    pub last_name: Option<String>,
    #[validate(length(max = 255))]
    pub nickname: Option<String>,
    pub password: Option<String>,
    #[validate(url(message = "The pic url format is invalid."))]
    pub pic_url: Option<String>,
    #[validate(length(max = 10))]
    #[schema(example = "en")]
    pub language: Option<String>,
    #[schema(example = "Europe/Madrid")]
    pub time_zone: Option<String>,
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    #[schema(value_type = Option<String>, format = Date, example = "1990-05-17")]
    pub birthday: Option<NaiveDate>,
    #[validate(url(message = "The facebook format is invalid."))]
    pub facebook: Option<String>,
    #[validate(url(message = "The twitter format is invalid."))]
    pub twitter: Option<String>,
    #[validate(url(message = "The website format is invalid."))]
    pub website: Option<String>,
}

impl UpdateProfileRequest {
    fn into_changes(self) -> (ProfileChanges, Option<String>) {
        let changes = ProfileChanges {
            first_name: self.first_name,
            last_name: self.last_name,
            nickname: self.nickname,
            password_hash: None,
            pic_url: self.pic_url,
            language: self.language,
            time_zone: self.time_zone,
            phone_number: self.phone_number,
            gender: self.gender,
            birthday: self.birthday,
            facebook: self.facebook,
            twitter: self.twitter,
            website: self.website,
        };
        (changes, self.password)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePreferencesRequest {
    /// One of `my_searches`, `product_viewed`, `product_purchased`,
    /// `product_shared`, `product_categories`
    #[schema(example = "product_viewed")]
    pub key: String,
    #[validate(length(min = 1, message = "The values field is required."))]
    #[schema(example = json!(["shoes", "red"]))]
    pub values: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EmailChangeRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "new@example.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleRequest {
    #[schema(example = "seller")]
    pub role: String,
}

/// Result of marking a notification as read
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadReceipt {
    /// False when the notification was missing, foreign or already read
    pub marked: bool,
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/deleted", get(list_deleted_users))
        .route("/me", get(get_current_user).put(update_current_user))
        .route("/me/products", get(my_products))
        .route("/me/preferences", put(update_preferences))
        .route("/me/notifications", get(my_notifications))
        .route("/me/notifications/:id/read", post(mark_notification_read))
        .route(
            "/me/email-change",
            get(my_email_changes).post(request_email_change),
        )
        .route("/:id", get(get_user).delete(delete_user))
        .route("/:id/role", put(update_role))
        .route("/:id/restore", post(restore_user))
        .route("/:id/disable", post(disable_user))
        .route("/:id/enable", post(enable_user))
}

/// Get current authenticated user
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_current_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.get_user(current_user.id).await?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn update_current_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<UserResponse>> {
    let (changes, password) = payload.into_changes();
    let user = state
        .user_service
        .update_profile(current_user.id, changes, password)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/users/me/products",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Products owned by the caller", body = Vec<Product>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn my_products(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(state.user_service.products(current_user.id).await?))
}

/// Merge entries into one preference list
#[utoipa::path(
    put,
    path = "/users/me/preferences",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = UpdatePreferencesRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 422, description = "Unknown preference key")
    )
)]
pub async fn update_preferences(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdatePreferencesRequest>,
) -> AppResult<Json<UserResponse>> {
    let key: PreferenceKey = payload.key.parse()?;
    let user = state
        .user_service
        .update_preferences(current_user.id, key, payload.values)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/users/me/notifications",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Notifications, newest first", body = Vec<Notification>)
    )
)]
pub async fn my_notifications(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Notification>>> {
    Ok(Json(state.user_service.notifications(current_user.id).await?))
}

#[utoipa::path(
    post,
    path = "/users/me/notifications/{id}/read",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Whether the notification was marked", body = ReadReceipt)
    )
)]
pub async fn mark_notification_read(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ReadReceipt>> {
    let marked = state
        .user_service
        .mark_notification_as_read(current_user.id, id)
        .await?;

    Ok(Json(ReadReceipt { marked }))
}

#[utoipa::path(
    get,
    path = "/users/me/email-change",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Email change petitions", body = Vec<EmailChangePetition>)
    )
)]
pub async fn my_email_changes(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<EmailChangePetition>>> {
    Ok(Json(
        state
            .user_service
            .email_change_petitions(current_user.id)
            .await?,
    ))
}

/// Ask to move the account to a new address. A confirmation link is sent
/// to that address.
#[utoipa::path(
    post,
    path = "/users/me/email-change",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = EmailChangeRequest,
    responses(
        (status = 201, description = "Petition created", body = EmailChangePetition),
        (status = 422, description = "Same or taken address")
    )
)]
pub async fn request_email_change(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<EmailChangeRequest>,
) -> AppResult<(StatusCode, Json<EmailChangePetition>)> {
    let petition = state
        .user_service
        .request_email_change(current_user.id, payload.email)
        .await?;

    Ok((StatusCode::CREATED, Json(petition)))
}

/// List active users (admin only)
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_users(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    require_admin(&current_user)?;

    let (users, total) = state.user_service.list_users(&params).await?;
    Ok(Json(Paginated::from_page(users, total, &params)))
}

#[utoipa::path(
    get,
    path = "/users/deleted",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Soft-deleted users", body = Vec<UserResponse>),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_deleted_users(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<UserResponse>>> {
    require_admin(&current_user)?;

    let users = state.user_service.list_deleted_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get user by ID (own profile or admin)
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 403, description = "Forbidden - Can only view own profile unless admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    require_self_or_admin(&current_user, id)?;

    let user = state.user_service.get_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/users/{id}/role",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = UserResponse),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Unknown role")
    )
)]
pub async fn update_role(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&current_user)?;

    if !is_valid_role(&payload.role) {
        return Err(AppError::invalid_field(
            "role",
            "The role must be one of: admin, seller, business, person.",
        ));
    }

    let user = state
        .user_service
        .update_role(id, UserRole::from(payload.role.as_str()))
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Soft delete a user (admin only, cannot delete self)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Cannot delete your own account"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    require_admin(&current_user)?;

    state.user_service.delete_user(current_user.id, id).await?;
    Ok(NoContent)
}

#[utoipa::path(
    post,
    path = "/users/{id}/restore",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User restored", body = UserResponse),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn restore_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&current_user)?;

    let user = state.user_service.restore_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/users/{id}/disable",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User disabled", body = UserResponse),
        (status = 400, description = "Cannot disable your own account"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn disable_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&current_user)?;

    let user = state.user_service.disable_user(current_user.id, id).await?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/users/{id}/enable",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User enabled", body = UserResponse),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn enable_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&current_user)?;

    let user = state.user_service.enable_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_request_keeps_password_apart() {
        let request: UpdateProfileRequest = serde_json::from_value(json!({
            "first_name": "Jane",
            "password": "new-secret-123",
            "birthday": "1990-05-17"
        }))
        .unwrap();

        let (changes, password) = request.into_changes();

        assert_eq!(changes.first_name.as_deref(), Some("Jane"));
        assert_eq!(changes.password_hash, None);
        assert_eq!(password.as_deref(), Some("new-secret-123"));
        assert_eq!(changes.birthday, NaiveDate::from_ymd_opt(1990, 5, 17));
    }

    #[test]
    fn test_profile_links_must_be_urls() {
        let request = UpdateProfileRequest {
            website: Some("not a url".to_string()),
            ..Default::default()
        };

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("website"));
    }

    #[test]
    fn test_preferences_require_values() {
        let request = UpdatePreferencesRequest {
            key: "my_searches".to_string(),
            values: vec![],
        };
        assert!(request.validate().is_err());
    }
}
