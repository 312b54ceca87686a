//! Validation rules attached to product features.
//!
//! Features store their rules as a pipe-joined string (`required|max:20`).
//! At request time the string is parsed into a [`RuleSet`] and evaluated
//! against submitted values.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{ValidateEmail, ValidateUrl};

use crate::errors::{AppError, AppResult, FieldErrors};

/// A single validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    Required,
    Nullable,
    String,
    Numeric,
    Integer,
    Alpha,
    AlphaNum,
    Email,
    Url,
    Min(u64),
    Max(u64),
    In(Vec<String>),
}

impl ValidationRule {
    /// Rule name as written in rule strings
    pub fn name(&self) -> &'static str {
        match self {
            ValidationRule::Required => "required",
            ValidationRule::Nullable => "nullable",
            ValidationRule::String => "string",
            ValidationRule::Numeric => "numeric",
            ValidationRule::Integer => "integer",
            ValidationRule::Alpha => "alpha",
            ValidationRule::AlphaNum => "alpha_num",
            ValidationRule::Email => "email",
            ValidationRule::Url => "url",
            ValidationRule::Min(_) => "min",
            ValidationRule::Max(_) => "max",
            ValidationRule::In(_) => "in",
        }
    }

    /// Whether the rule takes a parameter (`max:20`)
    fn takes_parameter(name: &str) -> bool {
        matches!(name, "min" | "max" | "in")
    }

    fn flag(name: &str) -> Option<Self> {
        let rule = match name {
            "required" => ValidationRule::Required,
            "nullable" => ValidationRule::Nullable,
            "string" => ValidationRule::String,
            "numeric" => ValidationRule::Numeric,
            "integer" => ValidationRule::Integer,
            "alpha" => ValidationRule::Alpha,
            "alpha_num" => ValidationRule::AlphaNum,
            "email" => ValidationRule::Email,
            "url" => ValidationRule::Url,
            _ => return None,
        };
        Some(rule)
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationRule::Min(n) | ValidationRule::Max(n) => write!(f, "{}:{}", self.name(), n),
            ValidationRule::In(options) => write!(f, "in:{}", options.join(",")),
            _ => f.write_str(self.name()),
        }
    }
}

impl FromStr for ValidationRule {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (name, parameter) = match raw.split_once(':') {
            Some((name, parameter)) => (name.trim(), Some(parameter.trim())),
            None => (raw, None),
        };

        if let Some(rule) = ValidationRule::flag(name) {
            return match parameter {
                None => Ok(rule),
                Some(_) => Err(AppError::validation(format!(
                    "The {} rule does not take a parameter",
                    name
                ))),
            };
        }

        if !ValidationRule::takes_parameter(name) {
            return Err(AppError::validation(format!(
                "Unknown validation rule: {}",
                name
            )));
        }

        let parameter = parameter.filter(|p| !p.is_empty()).ok_or_else(|| {
            AppError::validation(format!("The {} rule requires a parameter", name))
        })?;

        match name {
            "in" => {
                let options: Vec<String> = parameter
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect();
                if options.is_empty() {
                    return Err(AppError::validation("The in rule requires at least one option"));
                }
                Ok(ValidationRule::In(options))
            }
            _ => {
                let bound: u64 = parameter.parse().map_err(|_| {
                    AppError::validation(format!(
                        "The {} rule requires a whole number, got '{}'",
                        name, parameter
                    ))
                })?;
                Ok(if name == "min" {
                    ValidationRule::Min(bound)
                } else {
                    ValidationRule::Max(bound)
                })
            }
        }
    }
}

/// Ordered set of rules, one per rule name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuleSet {
    rules: Vec<ValidationRule>,
}

impl RuleSet {
    /// Parse a pipe-joined rule string. Blank input yields an empty set.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let mut set = RuleSet::default();
        for part in raw.split('|').map(str::trim).filter(|p| !p.is_empty()) {
            set.push(part.parse()?);
        }
        Ok(set)
    }

    /// Build a rule set from the option map submitted by the feature form,
    /// e.g. `{"required": 1, "max": 20}`. Submission order is kept.
    pub fn from_options(options: &Map<String, Value>) -> AppResult<Self> {
        let mut set = RuleSet::default();

        for (name, value) in options {
            let name = name.trim();
            if let Some(rule) = ValidationRule::flag(name) {
                if is_truthy(value) {
                    set.push(rule);
                }
                continue;
            }

            if !ValidationRule::takes_parameter(name) {
                return Err(AppError::validation(format!(
                    "Unknown validation rule: {}",
                    name
                )));
            }

            if let Some(parameter) = parameter_of(name, value)? {
                set.push(format!("{}:{}", name, parameter).parse()?);
            }
        }

        Ok(set)
    }

    fn push(&mut self, rule: ValidationRule) {
        if !self.rules.iter().any(|r| r.name() == rule.name()) {
            self.rules.push(rule);
        }
    }

    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn is_required(&self) -> bool {
        self.rules.contains(&ValidationRule::Required)
    }

    /// Same rules without `required`; used for optional listing filters.
    pub fn without_required(&self) -> Self {
        Self {
            rules: self
                .rules
                .iter()
                .filter(|r| **r != ValidationRule::Required)
                .cloned()
                .collect(),
        }
    }

    /// Render as a stored rule string, `None` when there are no rules.
    pub fn to_stored(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }

    /// Evaluate a submitted value, returning one message per failed rule.
    ///
    /// Absent or blank values only fail `required`.
    pub fn check(&self, field: &str, value: Option<&str>) -> Vec<String> {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return if self.is_required() {
                vec![format!("The {} field is required.", field)]
            } else {
                Vec::new()
            };
        };

        let numeric = self
            .rules
            .iter()
            .any(|r| matches!(r, ValidationRule::Numeric | ValidationRule::Integer));

        self.rules
            .iter()
            .filter_map(|rule| check_rule(rule, field, value, numeric))
            .collect()
    }
}

fn check_rule(rule: &ValidationRule, field: &str, value: &str, numeric: bool) -> Option<String> {
    let failed = match rule {
        ValidationRule::Required | ValidationRule::Nullable | ValidationRule::String => false,
        ValidationRule::Numeric => value.parse::<f64>().is_err(),
        ValidationRule::Integer => value.parse::<i64>().is_err(),
        ValidationRule::Alpha => !value.chars().all(char::is_alphabetic),
        ValidationRule::AlphaNum => !value.chars().all(char::is_alphanumeric),
        ValidationRule::Email => !value.validate_email(),
        ValidationRule::Url => !value.validate_url(),
        ValidationRule::Min(min) => {
            if numeric {
                value.parse::<f64>().map(|v| v < *min as f64).unwrap_or(false)
            } else {
                (value.chars().count() as u64) < *min
            }
        }
        ValidationRule::Max(max) => {
            if numeric {
                value.parse::<f64>().map(|v| v > *max as f64).unwrap_or(false)
            } else {
                (value.chars().count() as u64) > *max
            }
        }
        ValidationRule::In(options) => !options.iter().any(|o| o == value),
    };

    if !failed {
        return None;
    }

    let message = match rule {
        ValidationRule::Numeric => format!("The {} must be a number.", field),
        ValidationRule::Integer => format!("The {} must be an integer.", field),
        ValidationRule::Alpha => format!("The {} may only contain letters.", field),
        ValidationRule::AlphaNum => {
            format!("The {} may only contain letters and numbers.", field)
        }
        ValidationRule::Email => format!("The {} must be a valid email address.", field),
        ValidationRule::Url => format!("The {} format is invalid.", field),
        ValidationRule::Min(min) if numeric => format!("The {} must be at least {}.", field, min),
        ValidationRule::Min(min) => {
            format!("The {} must be at least {} characters.", field, min)
        }
        ValidationRule::Max(max) if numeric => {
            format!("The {} may not be greater than {}.", field, max)
        }
        ValidationRule::Max(max) => {
            format!("The {} may not be greater than {} characters.", field, max)
        }
        ValidationRule::In(_) => format!("The selected {} is invalid.", field),
        ValidationRule::Required | ValidationRule::Nullable | ValidationRule::String => {
            return None
        }
    };

    Some(message)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "on" | "yes"
        ),
        _ => false,
    }
}

fn parameter_of(name: &str, value: &Value) -> AppResult<Option<String>> {
    let parameter = match value {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(",");
            Some(joined).filter(|s| !s.is_empty())
        }
        Value::Bool(true) | Value::Object(_) => {
            return Err(AppError::validation(format!(
                "The {} rule requires a parameter",
                name
            )))
        }
    };
    Ok(parameter)
}

/// Validate a set of submitted field values against per-field rules.
///
/// Every rule set is evaluated, so required fields missing from `values`
/// are reported. Values without rules are accepted as-is.
pub fn validate_fields(
    rules: &BTreeMap<String, RuleSet>,
    values: &BTreeMap<String, String>,
) -> AppResult<()> {
    let mut errors = FieldErrors::new();

    for (field, set) in rules {
        let messages = set.check(field, values.get(field).map(String::as_str));
        if !messages.is_empty() {
            errors.insert(field.clone(), messages);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidFields(errors))
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.rules.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join("|"))
    }
}

impl FromStr for RuleSet {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        RuleSet::parse(raw)
    }
}

impl TryFrom<String> for RuleSet {
    type Error = AppError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        RuleSet::parse(&raw)
    }
}

impl From<RuleSet> for String {
    fn from(set: RuleSet) -> Self {
        set.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_and_render_keep_order() {
        let set = RuleSet::parse("required|max:20|min:10").unwrap();
        assert_eq!(
            set.rules(),
            &[
                ValidationRule::Required,
                ValidationRule::Max(20),
                ValidationRule::Min(10)
            ]
        );
        assert_eq!(set.to_string(), "required|max:20|min:10");
    }

    #[test]
    fn test_parse_blank_is_empty() {
        assert!(RuleSet::parse("").unwrap().is_empty());
        assert!(RuleSet::parse(" | ").unwrap().is_empty());
        assert_eq!(RuleSet::parse("").unwrap().to_stored(), None);
    }

    #[test]
    fn test_parse_rejects_unknown_and_malformed_rules() {
        assert!(RuleSet::parse("required|shiny").is_err());
        assert!(RuleSet::parse("max:abc").is_err());
        assert!(RuleSet::parse("min").is_err());
        assert!(RuleSet::parse("required:1").is_err());
    }

    #[test]
    fn test_duplicate_rules_keep_first() {
        let set = RuleSet::parse("max:5|required|max:9").unwrap();
        assert_eq!(set.to_string(), "max:5|required");
    }

    #[test]
    fn test_from_options_flag_rule() {
        let set = RuleSet::from_options(&options(json!({ "required": 1 }))).unwrap();
        assert_eq!(set.to_stored().as_deref(), Some("required"));
    }

    #[test]
    fn test_from_options_skips_falsy_values() {
        let set = RuleSet::from_options(&options(json!({
            "required": 0,
            "numeric": "on",
            "max": 20,
            "min": "",
            "alpha": false
        })))
        .unwrap();
        assert_eq!(set.to_string(), "numeric|max:20");
    }

    #[test]
    fn test_from_options_in_list() {
        let set = RuleSet::from_options(&options(json!({ "in": ["red", "blue"] }))).unwrap();
        assert_eq!(set.to_string(), "in:red,blue");
    }

    #[test]
    fn test_from_options_rejects_unknown_rule() {
        assert!(RuleSet::from_options(&options(json!({ "sparkly": 1 }))).is_err());
        assert!(RuleSet::from_options(&options(json!({ "max": true }))).is_err());
    }

    #[test]
    fn test_check_required() {
        let set = RuleSet::parse("required").unwrap();
        assert_eq!(set.check("color", None).len(), 1);
        assert_eq!(set.check("color", Some("  ")).len(), 1);
        assert!(set.check("color", Some("red")).is_empty());
    }

    #[test]
    fn test_check_optional_blank_skips_other_rules() {
        let set = RuleSet::parse("numeric|min:10").unwrap();
        assert!(set.check("size", None).is_empty());
    }

    #[test]
    fn test_check_length_bounds() {
        let set = RuleSet::parse("required|max:5|min:2").unwrap();
        assert!(set.check("code", Some("abc")).is_empty());
        assert_eq!(
            set.check("code", Some("abcdefg")),
            vec!["The code may not be greater than 5 characters.".to_string()]
        );
        assert_eq!(set.check("code", Some("a")).len(), 1);
    }

    #[test]
    fn test_check_numeric_bounds() {
        let set = RuleSet::parse("numeric|min:10|max:20").unwrap();
        assert!(set.check("size", Some("15")).is_empty());
        assert_eq!(
            set.check("size", Some("9")),
            vec!["The size must be at least 10.".to_string()]
        );
        assert_eq!(set.check("size", Some("big")).len(), 1);
    }

    #[test]
    fn test_check_in_and_email() {
        let colors = RuleSet::parse("in:red,blue").unwrap();
        assert!(colors.check("color", Some("red")).is_empty());
        assert_eq!(colors.check("color", Some("green")).len(), 1);

        let email = RuleSet::parse("email").unwrap();
        assert!(email.check("contact", Some("shop@example.com")).is_empty());
        assert_eq!(email.check("contact", Some("nope")).len(), 1);
    }

    #[test]
    fn test_without_required() {
        let set = RuleSet::parse("required|max:20").unwrap();
        assert_eq!(set.without_required().to_string(), "max:20");
    }

    #[test]
    fn test_validate_fields_collects_errors() {
        let mut rules = BTreeMap::new();
        rules.insert("features.color".to_string(), RuleSet::parse("required").unwrap());
        rules.insert("features.size".to_string(), RuleSet::parse("numeric").unwrap());

        let mut values = BTreeMap::new();
        values.insert("features.size".to_string(), "xl".to_string());

        match validate_fields(&rules, &values) {
            Err(AppError::InvalidFields(fields)) => {
                assert!(fields.contains_key("features.color"));
                assert!(fields.contains_key("features.size"));
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[test]
    fn test_serde_as_string() {
        let set: RuleSet = serde_json::from_value(json!("required|min:2")).unwrap();
        assert_eq!(serde_json::to_value(&set).unwrap(), json!("required|min:2"));
    }
}
