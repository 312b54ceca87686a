//! Product entity.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::feature::ProductType;
use crate::config::FEATURE_FIELD_PREFIX;

/// Product domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    /// Owner (seller) of the product
    pub user_id: Uuid,
    #[schema(example = "Leather boots")]
    pub name: String,
    pub description: Option<String>,
    /// Price in the smallest currency unit
    #[schema(example = 12999)]
    pub price_cents: i64,
    pub stock: i32,
    pub product_type: ProductType,
    pub status: bool,
    /// Feature values keyed by feature name
    pub features: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product creation data
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i32,
    pub product_type: ProductType,
    pub features: BTreeMap<String, String>,
    pub tags: Vec<String>,
}

/// Product update data; absent fields keep their value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i32>,
    pub status: Option<bool>,
    pub features: Option<BTreeMap<String, String>>,
    pub tags: Option<Vec<String>>,
}

/// Listing filters: feature name to the exact value a product must carry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub features: BTreeMap<String, String>,
    pub user_id: Option<Uuid>,
}

impl ProductFilter {
    /// Pull `features.<name>=value` pairs out of raw query parameters.
    /// Other parameters are ignored.
    pub fn from_query(query: &BTreeMap<String, String>) -> Self {
        let features = query
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(FEATURE_FIELD_PREFIX)
                    .filter(|name| !name.is_empty())
                    .map(|name| (name.to_string(), value.trim().to_string()))
            })
            .filter(|(_, value)| !value.is_empty())
            .collect();

        Self {
            features,
            user_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_query_keeps_feature_params() {
        let mut query = BTreeMap::new();
        query.insert("features.color".to_string(), "red".to_string());
        query.insert("features.size".to_string(), " ".to_string());
        query.insert("features.".to_string(), "x".to_string());
        query.insert("page".to_string(), "2".to_string());

        let filter = ProductFilter::from_query(&query);

        assert_eq!(filter.features.len(), 1);
        assert_eq!(filter.features["color"], "red");
    }
}
