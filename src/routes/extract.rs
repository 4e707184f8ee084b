//! `ValidJson<T>`: JSON body extractor that also runs `validator` rules.
//! Both malformed JSON and rule violations become `AppError::Validation`, so
//! bad requests are rejected before any core code runs.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::Validation(e.body_text()))?;
        value.validate().map_err(|e| AppError::Validation(describe(&e)))?;
        Ok(ValidJson(value))
    }
}

/// "field: message" pairs, sorted for stable output.
fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{field}: {msg}")
            })
        })
        .collect();
    if parts.is_empty() {
        // Only nested errors (e.g. inside `answers`).
        return format!("invalid request: {errors}");
    }
    parts.sort();
    parts.join("; ")
}
