//! OpenAPI documentation served through Swagger UI.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{auth_handler, feature_handler, product_handler, user_handler};
use crate::domain::{
    EmailChangePetition, Feature, InputType, Notification, PreferenceKey, Product, ProductType,
    UserResponse, UserRole,
};
use crate::services::TokenResponse;
use crate::types::{MessageResponse, PaginationMeta};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = "Products with dynamically configured features, and the accounts that sell and buy them",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        auth_handler::register,
        auth_handler::login,
        auth_handler::forgot_password,
        auth_handler::reset_password,
        auth_handler::confirm_email_change,
        feature_handler::filterable_features,
        feature_handler::filterable_rules,
        feature_handler::list_features,
        feature_handler::create_feature,
        feature_handler::get_feature,
        feature_handler::update_feature,
        feature_handler::delete_feature,
        product_handler::list_products,
        product_handler::get_product,
        product_handler::create_product,
        product_handler::update_product,
        product_handler::delete_product,
        user_handler::get_current_user,
        user_handler::update_current_user,
        user_handler::my_products,
        user_handler::update_preferences,
        user_handler::my_notifications,
        user_handler::mark_notification_read,
        user_handler::my_email_changes,
        user_handler::request_email_change,
        user_handler::list_users,
        user_handler::list_deleted_users,
        user_handler::get_user,
        user_handler::update_role,
        user_handler::delete_user,
        user_handler::restore_user,
        user_handler::disable_user,
        user_handler::enable_user,
    ),
    components(
        schemas(
            UserRole,
            UserResponse,
            PreferenceKey,
            Feature,
            InputType,
            ProductType,
            Product,
            Notification,
            EmailChangePetition,
            TokenResponse,
            MessageResponse,
            PaginationMeta,
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            auth_handler::ForgotPasswordRequest,
            auth_handler::ResetPasswordRequest,
            auth_handler::ConfirmEmailRequest,
            feature_handler::FeatureRequest,
            product_handler::CreateProductRequest,
            product_handler::UpdateProductRequest,
            user_handler::UpdateProfileRequest,
            user_handler::UpdatePreferencesRequest,
            user_handler::EmailChangeRequest,
            user_handler::UpdateRoleRequest,
            user_handler::ReadReceipt,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Accounts, tokens, password reset and email confirmation"),
        (name = "Features", description = "Dynamic product features and their validation rules"),
        (name = "Products", description = "Product catalog"),
        (name = "Users", description = "Profiles, preferences, notifications and account management")
    )
)]
pub struct ApiDoc;

/// JWT Bearer authentication scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_feature_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/features/filterable/rules"));
        assert!(doc.paths.paths.contains_key("/users/me/notifications/{id}/read"));
    }
}
