use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Everything an admin or checkout call can fail with. Validation-class
/// errors never mutate state; `Conflict` means a lost race on an atomic
/// update and is safe to retry with fresh data.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("max_quantity {requested} is below sold quantity {sold}; minimum acceptable value is {sold}")]
    CapacityBelowSold { requested: i64, sold: i64 },

    #[error("pass has {sold} confirmed sales and cannot be deleted; deactivate it instead")]
    PassHasSales { sold: i64 },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("payment method '{method}' is not accepted for this pass")]
    MethodNotAllowed { method: String },

    #[error("pass is not active")]
    PassInactive,

    #[error("pass is sold out")]
    SoldOut,

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::CapacityBelowSold { .. } => StatusCode::CONFLICT,
            AppError::PassHasSales { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::MethodNotAllowed { .. } => StatusCode::FORBIDDEN,
            AppError::PassInactive => StatusCode::CONFLICT,
            AppError::SoldOut => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::CapacityBelowSold { .. } => "CAPACITY_BELOW_SOLD",
            AppError::PassHasSales { .. } => "PASS_HAS_SALES",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            AppError::PassInactive => "PASS_INACTIVE",
            AppError::SoldOut => "SOLD_OUT",
            AppError::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Internal details stay in the logs, not in the response body
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                "A database error occurred".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": { "code": code, "message": message } }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_below_sold_names_both_numbers() {
        let err = AppError::CapacityBelowSold { requested: 5, sold: 12 };
        let msg = err.to_string();
        assert!(msg.contains('5') && msg.contains("12"), "message was: {msg}");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn pass_has_sales_names_the_count() {
        let err = AppError::PassHasSales { sold: 3 };
        assert!(err.to_string().contains('3'));
        assert_eq!(err.code(), "PASS_HAS_SALES");
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let err = AppError::Validation { field: "price", reason: "must be >= 0".into() };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("price"));
    }
}
