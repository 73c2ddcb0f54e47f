use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use velo_core::DomainError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::InvalidQuantity => {
            json_error(StatusCode::BAD_REQUEST, "invalid_quantity", err.to_string())
        }
        DomainError::EmptyCart => json_error(StatusCode::BAD_REQUEST, "empty_cart", err.to_string()),
        DomainError::Validation(_) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string())
        }
        DomainError::VariantUnavailable(_) => {
            json_error(StatusCode::CONFLICT, "variant_unavailable", err.to_string())
        }
        DomainError::InsufficientStock(_) => {
            json_error(StatusCode::CONFLICT, "insufficient_stock", err.to_string())
        }
        DomainError::InvalidTransition { .. } => {
            json_error(StatusCode::CONFLICT, "invalid_transition", err.to_string())
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Storage(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn forbidden() -> axum::response::Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", "admin role required")
}
