//! Product feature entity.
//!
//! A feature is a dynamically configured product attribute (color, size,
//! license key…). Its validation rules are stored as a rule string and
//! interpreted when products are validated.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use super::rules::{validate_fields, RuleSet};
use crate::config::FEATURE_FIELD_PREFIX;
use crate::errors::{AppError, AppResult, FieldErrors};

/// Error reported on `name` when another feature already uses it
pub const FEATURE_NAME_TAKEN: &str = "The name has already been taken.";

/// How the feature is rendered in product forms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Text,
    Select,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Select => "select",
        }
    }
}

impl From<&str> for InputType {
    fn from(s: &str) -> Self {
        match s {
            "select" => InputType::Select,
            _ => InputType::Text,
        }
    }
}

/// Kind of product a feature applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    #[default]
    Item,
    Key,
    Software,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Item => "item",
            ProductType::Key => "key",
            ProductType::Software => "software",
        }
    }
}

impl From<&str> for ProductType {
    fn from(s: &str) -> Self {
        match s {
            "key" => ProductType::Key,
            "software" => ProductType::Software,
            _ => ProductType::Item,
        }
    }
}

/// Feature domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Feature {
    pub id: Uuid,
    #[schema(example = "color")]
    pub name: String,
    pub input_type: InputType,
    pub product_type: ProductType,
    #[schema(example = "Pick the main color of the item")]
    pub help_message: Option<String>,
    /// Disabled features are hidden from forms and filters
    pub status: bool,
    pub filterable: bool,
    #[schema(example = "required|max:20")]
    pub validation_rules: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feature {
    /// Parsed validation rules; empty when none are stored.
    pub fn rules(&self) -> AppResult<RuleSet> {
        match &self.validation_rules {
            Some(raw) => RuleSet::parse(raw),
            None => Ok(RuleSet::default()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status
    }

    pub fn is_filterable(&self) -> bool {
        self.status && self.filterable
    }

    /// Field key used in rule maps and listing filters (`features.color`).
    pub fn field_key(&self) -> String {
        format!("{}{}", FEATURE_FIELD_PREFIX, self.name)
    }
}

/// Feature creation data. Omitted attributes take their defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewFeature {
    pub name: String,
    pub input_type: InputType,
    pub product_type: ProductType,
    pub help_message: Option<String>,
    pub status: bool,
    pub filterable: bool,
    pub validation_rules: Option<String>,
}

impl NewFeature {
    /// A feature with default attributes.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: true,
            ..Default::default()
        }
    }

    /// Convert a rule option map (`{"required": 1}`) into the stored string.
    pub fn with_rule_options(mut self, options: Option<&Map<String, Value>>) -> AppResult<Self> {
        self.validation_rules = stored_rules(options)?;
        Ok(self)
    }
}

/// Feature update data.
///
/// Absent attributes keep their current value, except `validation_rules`
/// which is always written: an update without rules clears them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureChanges {
    pub name: Option<String>,
    pub input_type: Option<InputType>,
    pub product_type: Option<ProductType>,
    pub help_message: Option<String>,
    pub status: Option<bool>,
    pub filterable: Option<bool>,
    pub validation_rules: Option<String>,
}

impl FeatureChanges {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_rule_options(mut self, options: Option<&Map<String, Value>>) -> AppResult<Self> {
        self.validation_rules = stored_rules(options)?;
        Ok(self)
    }
}

fn stored_rules(options: Option<&Map<String, Value>>) -> AppResult<Option<String>> {
    match options {
        Some(options) => Ok(RuleSet::from_options(options)?.to_stored()),
        None => Ok(None),
    }
}

/// Map `features.<name>` to the rule string of every filterable feature
/// that has rules.
pub fn filterable_validation_rules(features: &[Feature]) -> BTreeMap<String, String> {
    features
        .iter()
        .filter(|f| f.is_filterable())
        .filter_map(|f| {
            f.validation_rules
                .as_deref()
                .map(str::trim)
                .filter(|rules| !rules.is_empty())
                .map(|rules| (f.field_key(), rules.to_string()))
        })
        .collect()
}

/// Parsed rule sets keyed by `features.<name>` for the given features.
pub fn rule_sets(features: &[Feature]) -> AppResult<BTreeMap<String, RuleSet>> {
    features
        .iter()
        .map(|f| Ok((f.field_key(), f.rules()?)))
        .collect()
}

/// Check product feature values (keyed by feature name) against the active
/// features for `product_type`. Values for unknown features are rejected and
/// required features must be present.
pub fn validate_product_features(
    active: &[Feature],
    product_type: ProductType,
    values: &BTreeMap<String, String>,
) -> AppResult<()> {
    let applicable: Vec<Feature> = active
        .iter()
        .filter(|f| f.is_active() && f.product_type == product_type)
        .cloned()
        .collect();

    let mut errors = unknown_names(&applicable, values, "The selected feature is invalid.");
    collect_errors(&mut errors, validate_fields(&rule_sets(&applicable)?, &prefixed(values)))?;

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidFields(errors))
    }
}

/// Check listing filters (keyed by feature name) against filterable
/// features. Filters are optional, so `required` never applies.
pub fn validate_filters(filterable: &[Feature], filters: &BTreeMap<String, String>) -> AppResult<()> {
    let usable: Vec<Feature> = filterable
        .iter()
        .filter(|f| f.is_filterable())
        .cloned()
        .collect();

    let mut errors = unknown_names(&usable, filters, "The selected filter is invalid.");
    let rules = rule_sets(&usable)?
        .into_iter()
        .map(|(field, set)| (field, set.without_required()))
        .collect();
    collect_errors(&mut errors, validate_fields(&rules, &prefixed(filters)))?;

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidFields(errors))
    }
}

fn unknown_names(known: &[Feature], values: &BTreeMap<String, String>, message: &str) -> FieldErrors {
    values
        .keys()
        .filter(|name| !known.iter().any(|f| &f.name == *name))
        .map(|name| (format!("{}{}", FEATURE_FIELD_PREFIX, name), vec![message.to_string()]))
        .collect()
}

fn collect_errors(errors: &mut FieldErrors, result: AppResult<()>) -> AppResult<()> {
    match result {
        Err(AppError::InvalidFields(more)) => {
            for (field, messages) in more {
                errors.entry(field).or_default().extend(messages);
            }
            Ok(())
        }
        other => other,
    }
}

fn prefixed(values: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    values
        .iter()
        .map(|(name, value)| (format!("{}{}", FEATURE_FIELD_PREFIX, name), value.clone()))
        .collect()
}
