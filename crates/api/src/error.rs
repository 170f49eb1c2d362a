//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use serde_json::{Value, json};

/// API-level error type that maps to HTTP responses.
///
/// Every error renders as `{"error": <summary>, "details": <string or map>}`.
#[derive(Debug)]
pub enum ApiError {
    /// The request could not be decoded.
    BadRequest { error: &'static str, details: String },
    /// Domain logic error.
    Domain(DomainError),
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, Value) {
        match self {
            ApiError::BadRequest { error, details } => {
                (StatusCode::BAD_REQUEST, error, Value::String(details))
            }
            ApiError::Domain(err) => domain_error_parts(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = self.parts();
        metrics::counter!("api_errors_total", "status" => status.as_str().to_string()).increment(1);
        let body = json!({ "error": error, "details": details });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_parts(err: DomainError) -> (StatusCode, &'static str, Value) {
    match err {
        DomainError::Validation(errors) => (
            StatusCode::BAD_REQUEST,
            "Validation failed",
            serde_json::to_value(&errors).unwrap_or(Value::Null),
        ),
        DomainError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            "Not found",
            Value::String(err.to_string()),
        ),
        DomainError::UnknownReference { .. } => (
            StatusCode::BAD_REQUEST,
            "Invalid reference",
            Value::String(err.to_string()),
        ),
        DomainError::Conflict { detail, .. } => (
            StatusCode::BAD_REQUEST,
            "Error while saving object",
            Value::String(detail),
        ),
        DomainError::WeightLimitExceeded { .. } => (
            StatusCode::BAD_REQUEST,
            "Order weight limit exceeded",
            Value::String(err.to_string()),
        ),
        DomainError::Store(e) => {
            tracing::error!(error = %e, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                Value::String("An unexpected error occurred.".to_string()),
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest {
            error: "Invalid request body",
            details: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest {
            error: "Invalid path parameter",
            details: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest {
            error: "Invalid query string",
            details: rejection.body_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use common::Weight;
    use domain::{Entity, FieldErrors};

    use super::*;

    #[test]
    fn validation_details_are_a_field_map() {
        let mut errors = FieldErrors::new();
        errors.add("name", "This field may not be blank.");

        let (status, error, details) = ApiError::from(DomainError::Validation(errors)).parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error, "Validation failed");
        assert_eq!(details, json!({ "name": ["This field may not be blank."] }));
    }

    #[test]
    fn missing_path_resource_is_404_but_missing_reference_is_400() {
        let (status, _, details) =
            ApiError::from(DomainError::not_found(Entity::Order, 3)).parts();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(details, json!("order 3 not found"));

        let (status, _, details) =
            ApiError::from(DomainError::unknown_reference(Entity::Product, 8)).parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(details, json!("Referenced product 8 does not exist"));
    }

    #[test]
    fn weight_limit_reports_total() {
        let (status, _, details) = ApiError::from(DomainError::WeightLimitExceeded {
            total: Weight::from_hundredths(15_050),
            limit: Weight::from_kg(150),
        })
        .parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(details.as_str().unwrap().contains("150.50"));
    }

    #[test]
    fn store_failures_hide_internals() {
        let err = DomainError::Store(store::StoreError::Backend("pool timed out".to_string()));
        let (status, _, details) = ApiError::from(err).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!details.as_str().unwrap().contains("pool"));
    }
}
