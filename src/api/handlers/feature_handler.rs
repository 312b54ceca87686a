//! Product feature handlers.
//!
//! The filterable lookups are public and served from Redis when possible;
//! every write drops the cached entries.

use std::collections::BTreeMap;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::{trimmed, ValidatedJson};
use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::AppState;
use crate::domain::{Feature, FeatureChanges, InputType, NewFeature, ProductType};
use crate::errors::AppResult;
use crate::types::{NoContent, Paginated, PaginationParams};

/// Feature create/update form
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct FeatureRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(
        required(message = "The name field is required."),
        length(max = 255, message = "The name may not be greater than 255 characters.")
    )]
    #[schema(example = "color")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(required(message = "The help message field is required."))]
    #[schema(example = "Main color of the item")]
    pub help_message: Option<String>,
    pub input_type: Option<InputType>,
    pub product_type: Option<ProductType>,
    pub status: Option<bool>,
    pub filterable: Option<bool>,
    /// Rule options, e.g. `{"required": 1, "max": 20}`
    #[schema(value_type = Option<Object>)]
    pub validation_rules: Option<Map<String, Value>>,
    /// Feature being edited; excluded from the name uniqueness check
    pub current_feature: Option<Uuid>,
}

impl FeatureRequest {
    pub fn into_new_feature(self) -> AppResult<NewFeature> {
        NewFeature {
            name: self.name.unwrap_or_default(),
            input_type: self.input_type.unwrap_or_default(),
            product_type: self.product_type.unwrap_or_default(),
            help_message: self.help_message,
            status: self.status.unwrap_or(true),
            filterable: self.filterable.unwrap_or(false),
            validation_rules: None,
        }
        .with_rule_options(self.validation_rules.as_ref())
    }

    /// Changes plus the record to ignore when checking the name.
    pub fn into_changes(self) -> AppResult<(FeatureChanges, Option<Uuid>)> {
        let changes = FeatureChanges {
            name: self.name,
            input_type: self.input_type,
            product_type: self.product_type,
            help_message: self.help_message,
            status: self.status,
            filterable: self.filterable,
            validation_rules: None,
        }
        .with_rule_options(self.validation_rules.as_ref())?;

        Ok((changes, self.current_feature))
    }
}

/// Public lookups, mounted without authentication
pub fn public_feature_routes() -> Router<AppState> {
    Router::new()
        .route("/filterable", get(filterable_features))
        .route("/filterable/rules", get(filterable_rules))
}

/// Admin CRUD
pub fn feature_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_features).post(create_feature))
        .route(
            "/:id",
            get(get_feature).put(update_feature).delete(delete_feature),
        )
}

async fn forget_cached_features(state: &AppState) {
    if let Err(e) = state.cache.invalidate_features().await {
        tracing::warn!(error = %e, "Failed to invalidate cached features");
    }
}

/// Active features products can be filtered by
#[utoipa::path(
    get,
    path = "/features/filterable",
    tag = "Features",
    responses(
        (status = 200, description = "Filterable features", body = Vec<Feature>)
    )
)]
pub async fn filterable_features(State(state): State<AppState>) -> AppResult<Json<Vec<Feature>>> {
    match state.cache.get_filterable_features().await {
        Ok(Some(features)) => return Ok(Json(features)),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Feature cache read failed"),
    }

    let features = state.feature_service.filterable_features().await?;

    if let Err(e) = state.cache.set_filterable_features(&features).await {
        tracing::warn!(error = %e, "Feature cache write failed");
    }

    Ok(Json(features))
}

/// Validation rules of filterable features keyed by `features.<name>`
#[utoipa::path(
    get,
    path = "/features/filterable/rules",
    tag = "Features",
    responses(
        (status = 200, description = "Rule string per filter field", body = Object,
         example = json!({"features.color": "max:20", "features.size": "numeric|min:1"}))
    )
)]
pub async fn filterable_rules(
    State(state): State<AppState>,
) -> AppResult<Json<BTreeMap<String, String>>> {
    match state.cache.get_filterable_rules().await {
        Ok(Some(rules)) => return Ok(Json(rules)),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Feature cache read failed"),
    }

    let rules = state.feature_service.filterable_rules().await?;

    if let Err(e) = state.cache.set_filterable_rules(&rules).await {
        tracing::warn!(error = %e, "Feature cache write failed");
    }

    Ok(Json(rules))
}

#[utoipa::path(
    get,
    path = "/features",
    tag = "Features",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of features ordered by name", body = Vec<Feature>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_features(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Feature>>> {
    require_admin(&current_user)?;

    let (features, total) = state.feature_service.list_features(&params).await?;
    Ok(Json(Paginated::from_page(features, total, &params)))
}

#[utoipa::path(
    post,
    path = "/features",
    tag = "Features",
    security(("bearer_auth" = [])),
    request_body = FeatureRequest,
    responses(
        (status = 201, description = "Feature created", body = Feature),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 422, description = "Validation error or name taken")
    )
)]
pub async fn create_feature(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<FeatureRequest>,
) -> AppResult<(StatusCode, Json<Feature>)> {
    require_admin(&current_user)?;

    let feature = state
        .feature_service
        .create_feature(payload.into_new_feature()?)
        .await?;
    forget_cached_features(&state).await;

    Ok((StatusCode::CREATED, Json(feature)))
}

#[utoipa::path(
    get,
    path = "/features/{id}",
    tag = "Features",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Feature ID")),
    responses(
        (status = 200, description = "Feature", body = Feature),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Feature not found")
    )
)]
pub async fn get_feature(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Feature>> {
    require_admin(&current_user)?;
    Ok(Json(state.feature_service.get_feature(id).await?))
}

/// Update a feature. Rules missing from the form are cleared.
#[utoipa::path(
    put,
    path = "/features/{id}",
    tag = "Features",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Feature ID")),
    request_body = FeatureRequest,
    responses(
        (status = 200, description = "Feature updated", body = Feature),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Feature not found"),
        (status = 422, description = "Validation error or name taken")
    )
)]
pub async fn update_feature(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<FeatureRequest>,
) -> AppResult<Json<Feature>> {
    require_admin(&current_user)?;

    let (changes, current_feature) = payload.into_changes()?;
    let feature = state
        .feature_service
        .update_feature(id, changes, current_feature)
        .await?;
    forget_cached_features(&state).await;

    Ok(Json(feature))
}

#[utoipa::path(
    delete,
    path = "/features/{id}",
    tag = "Features",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Feature ID")),
    responses(
        (status = 204, description = "Feature deleted"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Feature not found")
    )
)]
pub async fn delete_feature(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    require_admin(&current_user)?;

    state.feature_service.delete_feature(id).await?;
    forget_cached_features(&state).await;

    Ok(NoContent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> FeatureRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_name_and_help_message_are_required() {
        let errors = request(json!({ "input_type": "select" }))
            .validate()
            .unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("help_message"));
    }

    #[test]
    fn test_new_feature_defaults() {
        let feature = request(json!({ "name": "color", "help_message": "Pick one" }))
            .into_new_feature()
            .unwrap();

        assert_eq!(feature.input_type, InputType::Text);
        assert_eq!(feature.product_type, ProductType::Item);
        assert!(feature.status);
        assert!(!feature.filterable);
        assert_eq!(feature.validation_rules, None);
    }

    #[test]
    fn test_rule_options_become_stored_rules() {
        let feature = request(json!({
            "name": "size",
            "help_message": "Shoe size",
            "validation_rules": { "required": 1 }
        }))
        .into_new_feature()
        .unwrap();

        assert_eq!(feature.validation_rules.as_deref(), Some("required"));
    }

    #[test]
    fn test_changes_without_rules_clear_them() {
        let current = Uuid::new_v4();
        let (changes, ignore) = request(json!({
            "name": "size",
            "help_message": "Shoe size",
            "current_feature": current
        }))
        .into_changes()
        .unwrap();

        assert_eq!(changes.validation_rules, None);
        assert_eq!(changes.name.as_deref(), Some("size"));
        assert_eq!(ignore, Some(current));
    }

    #[test]
    fn test_unknown_rule_is_rejected() {
        let result = request(json!({
            "name": "size",
            "help_message": "Shoe size",
            "validation_rules": { "shiny": 1 }
        }))
        .into_new_feature();

        assert!(result.is_err());
    }
}
