use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Domain errors surfaced by handlers and repos. Each variant maps to one
/// HTTP status; the `{error}` body carries a stable message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Insufficient stock")]
    InsufficientStock,

    #[error("Server configuration error")]
    Config(String),

    #[error("Server error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) | ApiError::InsufficientStock => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Config(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(source) => error!(error = %source, "internal error"),
            ApiError::Config(detail) => error!(detail = %detail, "configuration error"),
            _ => {}
        }
        let body = ErrorBody {
            // Display gives the generic message for 5xx variants, so internal
            // detail never reaches the client.
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // Unique violation on users.username surfaces as a conflict, the
            // same way a concurrent duplicate registration would.
            if db_err.code().as_deref() == Some("23505") {
                return ApiError::Conflict("Username already exists".into());
            }
        }
        ApiError::Internal(Box::new(err))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("dup".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::InsufficientStock.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Auth("nope".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("admins only".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("gone".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Config("missing secret".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_keep_a_generic_message() {
        let err = ApiError::Internal(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            "connection reset by peer",
        )));
        assert_eq!(err.to_string(), "Server error");

        let err = ApiError::Config("JWT_SECRET is empty".into());
        assert_eq!(err.to_string(), "Server configuration error");
    }

    #[test]
    fn insufficient_stock_message_is_stable() {
        assert_eq!(ApiError::InsufficientStock.to_string(), "Insufficient stock");
    }
}
