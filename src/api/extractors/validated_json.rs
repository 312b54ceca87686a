//! Validated JSON extractor - deserialization plus `validator` checks.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::errors::{AppError, FieldErrors};

/// JSON body that has passed its `Validate` rules.
///
/// Malformed bodies and rule failures are both rejected with 422; rule
/// failures carry a per-field message map.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::InvalidFields(field_errors(&e)))?;

        Ok(ValidatedJson(value))
    }
}

/// `deserialize_with` helper: trims the string and reads blank input as
/// absent, so `required` rejects whitespace-only values.
pub fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| match (&e.message, e.code.as_ref()) {
                    (Some(message), _) => message.to_string(),
                    (None, "required") => format!("The {} field is required.", field),
                    (None, _) => format!("The {} field is invalid.", field),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}
