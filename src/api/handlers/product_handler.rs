//! Product handlers.

use std::collections::BTreeMap;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{NewProduct, Product, ProductChanges, ProductFilter, ProductType};
use crate::errors::{AppError, AppResult};
use crate::types::{NoContent, Paginated, PaginationParams};

/// Product creation form
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    #[schema(example = "Leather boots")]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "The price must be at least 0."))]
    #[schema(example = 12999)]
    pub price_cents: i64,
    #[validate(range(min = 0, message = "The stock must be at least 0."))]
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub product_type: ProductType,
    /// Feature values keyed by feature name
    #[serde(default)]
    #[schema(value_type = Object, example = json!({"color": "red", "size": 42}))]
    pub features: BTreeMap<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Product update form; absent fields keep their value
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "The price must be at least 0."))]
    pub price_cents: Option<i64>,
    #[validate(range(min = 0, message = "The stock must be at least 0."))]
    pub stock: Option<i32>,
    pub status: Option<bool>,
    #[schema(value_type = Option<Object>)]
    pub features: Option<BTreeMap<String, Value>>,
    pub tags: Option<Vec<String>>,
}

/// Feature values as submitted text. Numbers and booleans keep their JSON
/// spelling; null is an empty value.
fn feature_values(values: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    values
        .into_iter()
        .map(|(name, value)| {
            let text = match value {
                Value::String(text) => text.trim().to_string(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (name, text)
        })
        .collect()
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !cleaned.iter().any(|kept| kept == tag) {
            cleaned.push(tag.to_string());
        }
    }
    cleaned
}

/// Public reads
pub fn public_product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
}

/// Authenticated writes
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product))
        .route("/:id", put(update_product).delete(delete_product))
}

/// List active products.
///
/// Any `features.<name>=value` query parameter filters on that feature and
/// is checked against the filterable feature rules.
#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    params(
        PaginationParams,
        ("user_id" = Option<Uuid>, Query, description = "Only products of this seller"),
        ("features.<name>" = Option<String>, Query, description = "Exact feature value filter")
    ),
    responses(
        (status = 200, description = "Page of products", body = Vec<Product>),
        (status = 422, description = "Unknown or invalid filter")
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(query): Query<BTreeMap<String, String>>,
) -> AppResult<Json<Paginated<Product>>> {
    let mut filter = ProductFilter::from_query(&query);
    filter.user_id = match query.get("user_id").map(|id| id.trim()) {
        Some(id) if !id.is_empty() => Some(
            id.parse()
                .map_err(|_| AppError::invalid_field("user_id", "The user id must be a valid UUID."))?,
        ),
        _ => None,
    };

    let (products, total) = state.product_service.list_products(&filter, &params).await?;
    Ok(Json(Paginated::from_page(products, total, &params)))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product", body = Product),
        (status = 404, description = "Product not found")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    Ok(Json(state.product_service.get_product(id).await?))
}

/// Create a product owned by the caller. Feature values are validated
/// against the active features of the product type.
#[utoipa::path(
    post,
    path = "/products",
    tag = "Products",
    security(("bearer_auth" = [])),
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_product(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let product = state
        .product_service
        .create_product(NewProduct {
            user_id: current_user.id,
            name: payload.name.trim().to_string(),
            description: payload.description,
            price_cents: payload.price_cents,
            stock: payload.stock,
            product_type: payload.product_type,
            features: feature_values(payload.features),
            tags: clean_tags(payload.tags),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "Products",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 403, description = "Forbidden - owner or admin only"),
        (status = 404, description = "Product not found"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn update_product(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateProductRequest>,
) -> AppResult<Json<Product>> {
    let changes = ProductChanges {
        name: payload.name.map(|name| name.trim().to_string()),
        description: payload.description,
        price_cents: payload.price_cents,
        stock: payload.stock,
        status: payload.status,
        features: payload.features.map(feature_values),
        tags: payload.tags.map(clean_tags),
    };

    let product = state
        .product_service
        .update_product(current_user.actor(), id, changes)
        .await?;

    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "Products",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 403, description = "Forbidden - owner or admin only"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn delete_product(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    state
        .product_service
        .delete_product(current_user.actor(), id)
        .await?;

    Ok(NoContent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feature_values_are_stringified() {
        let values: BTreeMap<String, Value> = serde_json::from_value(json!({
            "color": " red ",
            "size": 42,
            "gift": true,
            "notes": null
        }))
        .unwrap();

        let values = feature_values(values);

        assert_eq!(values["color"], "red");
        assert_eq!(values["size"], "42");
        assert_eq!(values["gift"], "true");
        assert_eq!(values["notes"], "");
    }

    #[test]
    fn test_tags_are_trimmed_and_unique() {
        let tags = clean_tags(vec![
            "boots".to_string(),
            " leather ".to_string(),
            "boots".to_string(),
            " ".to_string(),
        ]);
        assert_eq!(tags, vec!["boots", "leather"]);
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let request: CreateProductRequest = serde_json::from_value(json!({
            "name": "Boots",
            "price_cents": -1
        }))
        .unwrap();

        assert!(request.validate().is_err());
        assert_eq!(request.product_type, ProductType::Item);
    }
}
