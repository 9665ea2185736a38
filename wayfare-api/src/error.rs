use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use wayfare_core::BookingError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    AuthenticationError(String),
    #[error("{0}")]
    AuthorizationError(String),
    #[error("{message}")]
    ValidationError {
        message: String,
        details: Option<serde_json::Value>,
    },
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    ConflictError(String),
    #[error("Rate limit exceeded")]
    RateLimitError,
    #[error("{0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError { message: message.into(), details: None }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::AuthenticationError(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::AuthorizationError(_) => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
            AppError::ValidationError { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::NotFoundError(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::ConflictError(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::RateLimitError => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            AppError::InternalServerError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Renders `{ error: { code, message, details?, requestId, timestamp } }`.
    pub fn into_envelope(self, request_id: &str) -> Response {
        let (status, code) = self.status_and_code();

        let (message, details) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error [{}]: {}", request_id, msg);
                ("Internal Server Error".to_string(), None)
            }
            AppError::ValidationError { message, details } => (message, details),
            other => (other.to_string(), None),
        };

        let mut error = json!({
            "code": code,
            "message": message,
            "requestId": request_id,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InvalidInput(msg) => AppError::validation(msg),
            BookingError::NotFound(msg) => AppError::NotFoundError(msg),
            BookingError::Unauthorized(msg) => AppError::AuthorizationError(msg),
            BookingError::Unauthenticated(msg) => AppError::AuthenticationError(msg),
            BookingError::Conflict(msg) => AppError::ConflictError(msg),
            BookingError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError {
            message: "Request body is not a valid booking request".to_string(),
            details: Some(json!({ "reason": rejection.body_text() })),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError {
            message: "Invalid query parameters".to_string(),
            details: Some(json!({ "reason": rejection.body_text() })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_errors_map_to_status() {
        let cases = [
            (BookingError::InvalidInput("x".into()), StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            (BookingError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (BookingError::Unauthorized("x".into()), StatusCode::FORBIDDEN, "UNAUTHORIZED"),
            (BookingError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (BookingError::Conflict("x".into()), StatusCode::CONFLICT, "CONFLICT"),
            (BookingError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];

        for (err, status, code) in cases {
            let expected_code = err.code();
            let app_err = AppError::from(err);
            assert_eq!(app_err.status_and_code(), (status, code));
            assert_eq!(expected_code, code);
        }
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let response = AppError::InternalServerError("connection refused".into()).into_envelope("req-1");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
