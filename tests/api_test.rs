//! API surface tests that need neither Postgres nor Redis: error responses,
//! request validation, response shapes and the service container seam.

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::FromRequest,
    http::{header, Request, StatusCode},
    response::IntoResponse,
};
use serde_json::{json, Value};
use uuid::Uuid;

use storefront::api::extractors::ValidatedJson;
use storefront::api::handlers::auth_handler::ResetPasswordRequest;
use storefront::api::handlers::feature_handler::FeatureRequest;
use storefront::domain::{User, UserResponse, UserRole};
use storefront::errors::AppError;
use storefront::services::{FeatureCatalog, FeatureService, MockServiceContainer, ServiceContainer};
use storefront::types::{MessageResponse, NoContent, Paginated, PaginationParams};

use common::{feature, TestUnitOfWork};

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn rejection<T>(body: &str) -> AppError
where
    T: serde::de::DeserializeOwned + validator::Validate + Send,
{
    match ValidatedJson::<T>::from_request(json_request(body), &()).await {
        Ok(_) => panic!("expected the body to be rejected"),
        Err(error) => error,
    }
}

// =============================================================================
// Error responses
// =============================================================================

#[tokio::test]
async fn test_error_status_codes() {
    assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::AccountDisabled.status(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::conflict("User").status(), StatusCode::CONFLICT);
    assert_eq!(
        AppError::validation("bad").status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        AppError::BadRequest("no".to_string()).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        AppError::internal("boom").status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_field_errors_are_reported_per_field() {
    let response = AppError::invalid_field("name", "The name has already been taken.").into_response();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["fields"]["name"][0], "The name has already been taken.");
}

#[tokio::test]
async fn test_internal_errors_hide_details() {
    let body = json_body(AppError::internal("connection refused on 10.0.0.3").into_response()).await;

    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    assert_eq!(body["error"]["message"], "An internal error occurred");
    assert!(body["error"].get("fields").is_none());
}

#[tokio::test]
async fn test_conflict_message_names_the_entity() {
    let body = json_body(AppError::conflict("User").into_response()).await;

    assert_eq!(body["error"]["message"], "User already exists");
}

// =============================================================================
// Request validation
// =============================================================================

#[tokio::test]
async fn test_missing_feature_fields_are_rejected() {
    let error = rejection::<FeatureRequest>(r#"{"input_type": "select"}"#).await;

    match error {
        AppError::InvalidFields(fields) => {
            assert_eq!(fields["name"], vec!["The name field is required."]);
            assert!(fields.contains_key("help_message"));
        }
        other => panic!("expected field errors, got {:?}", other),
    }
}

#[tokio::test]
async fn test_blank_feature_fields_are_rejected() {
    let error = rejection::<FeatureRequest>(r#"{"name": "   ", "help_message": " "}"#).await;

    match error {
        AppError::InvalidFields(fields) => {
            assert_eq!(fields["name"], vec!["The name field is required."]);
            assert_eq!(fields["help_message"], vec!["The help message field is required."]);
        }
        other => panic!("expected field errors, got {:?}", other),
    }
}

#[tokio::test]
async fn test_feature_name_is_stored_trimmed() {
    let result = ValidatedJson::<FeatureRequest>::from_request(
        json_request(r#"{"name": " color ", "help_message": "Main color"}"#),
        &(),
    )
    .await;

    let Ok(ValidatedJson(request)) = result else {
        panic!("expected a valid request");
    };
    assert_eq!(request.into_new_feature().unwrap().name, "color");
}

#[tokio::test]
async fn test_malformed_json_is_unprocessable() {
    let error = rejection::<FeatureRequest>("{not json").await;

    assert!(matches!(error, AppError::Validation(_)));
    assert_eq!(error.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_password_confirmation_must_match() {
    let error = rejection::<ResetPasswordRequest>(
        r#"{
            "email": "jane@example.com",
            "token": "abc",
            "password": "brand-new-password",
            "password_confirmation": "something-else"
        }"#,
    )
    .await;

    assert!(matches!(error, AppError::InvalidFields(fields) if fields.contains_key("password_confirmation")));
}

#[tokio::test]
async fn test_valid_feature_request_is_accepted() {
    let result = ValidatedJson::<FeatureRequest>::from_request(
        json_request(r#"{"name": "color", "help_message": "Main color", "filterable": true}"#),
        &(),
    )
    .await;

    let Ok(ValidatedJson(request)) = result else {
        panic!("expected a valid request");
    };
    assert_eq!(request.name.as_deref(), Some("color"));
    assert_eq!(request.filterable, Some(true));
}

// =============================================================================
// Response shapes
// =============================================================================

#[tokio::test]
async fn test_message_response_structure() {
    let value = serde_json::to_value(MessageResponse::new("We have emailed your password reset link.")).unwrap();

    assert_eq!(value, json!({ "message": "We have emailed your password reset link." }));
}

#[tokio::test]
async fn test_no_content_response() {
    assert_eq!(NoContent.into_response().status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_paginated_response_structure() {
    let params = PaginationParams::new(2, 10);
    let users = vec![
        User::new(
            Uuid::new_v4(),
            "jane".to_string(),
            "doe".to_string(),
            "jane@example.com".to_string(),
            "hashed".to_string(),
        ),
    ];

    let page: Paginated<UserResponse> = Paginated::from_page(users, 25, &params);
    let value = serde_json::to_value(&page).unwrap();

    assert_eq!(value["meta"], json!({ "page": 2, "per_page": 10, "total": 25, "total_pages": 3 }));
    assert_eq!(value["data"][0]["email"], "jane@example.com");
    assert!(value["data"][0].get("password_hash").is_none());
}

#[tokio::test]
async fn test_user_response_reports_role_and_name() {
    let mut user = User::new(
        Uuid::new_v4(),
        "jane".to_string(),
        "doe".to_string(),
        "jane@example.com".to_string(),
        "hashed".to_string(),
    );
    user.role = UserRole::Seller;

    let response = UserResponse::from(user);

    assert_eq!(response.role, "seller");
    assert_eq!(response.full_name, "Jane doe");
    assert!(!response.disabled);
}

// =============================================================================
// Service container
// =============================================================================

#[tokio::test]
async fn test_container_hands_out_services() {
    let mut uow = TestUnitOfWork::new();
    uow.features
        .expect_filterable()
        .returning(|| Ok(vec![feature("color", Some("max:20"))]));
    let catalog: Arc<dyn FeatureService> = Arc::new(FeatureCatalog::new(uow.build()));

    let mut container = MockServiceContainer::new();
    container
        .expect_features()
        .times(1)
        .returning(move || catalog.clone());

    let features = container.features().filterable_features().await.unwrap();

    assert_eq!(features.len(), 1);
    assert_eq!(features[0].field_key(), "features.color");
}
