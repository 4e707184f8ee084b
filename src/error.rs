//! Error taxonomy for the store and the HTTP boundary.
//!
//! `StoreError` is what the persistence layer reports; `AppError` is what the
//! core and handlers return. Conversion between the two decides which storage
//! failures callers may see (missing rows, conflicts) and which collapse into
//! a generic failure.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures raised inside a store transaction. Any of them rolls the
/// transaction back.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row references another row that does not exist.
    #[error("{entity} {id} does not exist")]
    MissingReference { entity: &'static str, id: u64 },

    /// Unique constraint violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other integrity rule violated.
    #[error("constraint violated: {0}")]
    Constraint(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing request fields. Raised before any core code runs.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Unknown or not-owned entity. The two cases are deliberately identical.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Persistence(StoreError),

    /// Anything else that is the server's fault.
    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::MissingReference { entity, .. } => AppError::NotFound(entity),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Persistence(other),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Storage details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::Persistence(_) => "Internal storage failure".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Persistence(e) = &self {
            error!(target: "iq_backend", error = %e, "Request aborted by storage failure");
        }
        let body = json!({ "success": false, "error": self.public_message() });
        (self.status(), Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_reference_maps_to_not_found() {
        let e: AppError = StoreError::MissingReference { entity: "test", id: 9 }.into();
        assert!(matches!(e, AppError::NotFound("test")));
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
        assert_eq!(e.to_string(), "test not found");
    }

    #[test]
    fn constraint_is_opaque_to_clients() {
        let e: AppError = StoreError::Constraint("score 7 exceeds 5".into()).into();
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.public_message(), "Internal storage failure");
    }

    #[test]
    fn conflict_keeps_its_message() {
        let e: AppError = StoreError::Conflict("User already exists".into()).into();
        assert_eq!(e.status(), StatusCode::CONFLICT);
        assert_eq!(e.public_message(), "User already exists");
    }
}
