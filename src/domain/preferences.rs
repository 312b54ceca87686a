//! User preferences value object.
//!
//! Preferences are stored as a JSON object mapping each key to a
//! comma-separated list (`{"product_viewed": "shoes,red,leather"}`).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::config::MAX_PREFERENCE_ENTRIES;
use crate::errors::AppError;

/// Keys a user may keep preferences under
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceKey {
    MySearches,
    ProductViewed,
    ProductPurchased,
    ProductShared,
    ProductCategories,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 5] = [
        PreferenceKey::MySearches,
        PreferenceKey::ProductViewed,
        PreferenceKey::ProductPurchased,
        PreferenceKey::ProductShared,
        PreferenceKey::ProductCategories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceKey::MySearches => "my_searches",
            PreferenceKey::ProductViewed => "product_viewed",
            PreferenceKey::ProductPurchased => "product_purchased",
            PreferenceKey::ProductShared => "product_shared",
            PreferenceKey::ProductCategories => "product_categories",
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PreferenceKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown preference key: {}", s)))
    }
}

/// Parsed user preferences. Every allowed key is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    entries: BTreeMap<PreferenceKey, Vec<String>>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            entries: PreferenceKey::ALL.into_iter().map(|k| (k, Vec::new())).collect(),
        }
    }
}

impl Preferences {
    /// Parse the stored JSON text. Missing or malformed data yields defaults.
    pub fn parse(stored: Option<&str>) -> Self {
        match stored.map(serde_json::from_str::<Value>) {
            Some(Ok(value)) => Self::from_value(&value),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Discarding malformed preferences");
                Self::default()
            }
            None => Self::default(),
        }
    }

    /// Read preferences from an already decoded JSON value. Unknown keys
    /// are dropped; values may be comma-separated strings or arrays.
    pub fn from_value(value: &Value) -> Self {
        let mut preferences = Self::default();
        let Some(object) = value.as_object() else {
            return preferences;
        };

        for key in PreferenceKey::ALL {
            let entries = match object.get(key.as_str()) {
                Some(Value::String(list)) => split_entries(list),
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .flat_map(split_entries)
                    .collect(),
                _ => Vec::new(),
            };
            preferences.entries.insert(key, dedupe_keep_latest(entries));
        }

        preferences
    }

    pub fn get(&self, key: PreferenceKey) -> &[String] {
        self.entries.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Merge `values` into `key`: new values go last, duplicates keep their
    /// most recent position and only the newest entries are kept.
    pub fn update<I, S>(&mut self, key: PreferenceKey, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let current = self.entries.remove(&key).unwrap_or_default();
        let incoming = values.into_iter().flat_map(|v| split_entries(v.as_ref()));
        let mut merged = dedupe_keep_latest(current.into_iter().chain(incoming).collect());

        if merged.len() > MAX_PREFERENCE_ENTRIES {
            merged.drain(..merged.len() - MAX_PREFERENCE_ENTRIES);
        }

        self.entries.insert(key, merged);
        self
    }

    /// JSON object of key to comma-separated entries.
    pub fn to_value(&self) -> Value {
        let object = self
            .entries
            .iter()
            .map(|(key, entries)| (key.as_str().to_string(), Value::String(entries.join(","))))
            .collect();
        Value::Object(object)
    }

    /// Stored JSON text.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

impl Serialize for Preferences {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Preferences {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(stored) => Preferences::parse(Some(&stored)),
            other => Preferences::from_value(&other),
        })
    }
}

fn split_entries(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

fn dedupe_keep_latest(entries: Vec<String>) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(entries.len());
    for entry in entries.into_iter().rev() {
        if !kept.contains(&entry) {
            kept.push(entry);
        }
    }
    kept.reverse();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_missing_fills_every_key() {
        let preferences = Preferences::parse(None);
        for key in PreferenceKey::ALL {
            assert!(preferences.get(key).is_empty());
        }
        let value = preferences.to_value();
        assert_eq!(value["my_searches"], json!(""));
        assert_eq!(value["product_categories"], json!(""));
    }

    #[test]
    fn test_parse_malformed_is_default() {
        assert_eq!(Preferences::parse(Some("{not json")), Preferences::default());
    }

    #[test]
    fn test_parse_stored_lists() {
        let stored = r#"{"product_viewed":"shoes,red","unknown":"x"}"#;
        let preferences = Preferences::parse(Some(stored));
        assert_eq!(preferences.get(PreferenceKey::ProductViewed), ["shoes", "red"]);
        assert!(!preferences.to_value().as_object().unwrap().contains_key("unknown"));
    }

    #[test]
    fn test_update_appends_and_dedupes() {
        let mut preferences = Preferences::parse(Some(r#"{"my_searches":"phone,case"}"#));
        preferences.update(PreferenceKey::MySearches, ["charger", "phone"]);
        assert_eq!(
            preferences.get(PreferenceKey::MySearches),
            ["case", "charger", "phone"]
        );
    }

    #[test]
    fn test_update_splits_comma_values() {
        let mut preferences = Preferences::default();
        preferences.update(PreferenceKey::ProductViewed, ["red, leather ,", " "]);
        assert_eq!(preferences.get(PreferenceKey::ProductViewed), ["red", "leather"]);
    }

    #[test]
    fn test_update_keeps_newest_entries() {
        let mut preferences = Preferences::default();
        let values: Vec<String> = (0..MAX_PREFERENCE_ENTRIES + 5).map(|i| format!("tag{}", i)).collect();
        preferences.update(PreferenceKey::ProductShared, &values);

        let kept = preferences.get(PreferenceKey::ProductShared);
        assert_eq!(kept.len(), MAX_PREFERENCE_ENTRIES);
        assert_eq!(kept.first().map(String::as_str), Some("tag5"));
        assert_eq!(kept.last().map(String::as_str), Some(values.last().unwrap().as_str()));
    }

    #[test]
    fn test_round_trip_json() {
        let mut preferences = Preferences::default();
        preferences.update(PreferenceKey::ProductPurchased, ["lamp"]);
        let restored = Preferences::parse(Some(&preferences.to_json()));
        assert_eq!(restored, preferences);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!("favourite_color".parse::<PreferenceKey>().is_err());
        assert_eq!(
            "product_viewed".parse::<PreferenceKey>().unwrap(),
            PreferenceKey::ProductViewed
        );
    }

    #[test]
    fn test_deserialize_accepts_string_or_object() {
        let from_object: Preferences =
            serde_json::from_value(json!({ "my_searches": ["a", "b"] })).unwrap();
        let from_string: Preferences =
            serde_json::from_value(json!(r#"{"my_searches":"a,b"}"#)).unwrap();
        assert_eq!(from_object, from_string);
    }
}
