//! The single mapping point from internal failures to HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use crew_db::error::{DatabaseError, ServiceError};
use thiserror::Error;

/// Response header naming the error kind.
pub const ERROR_KIND_HEADER: &str = "x-crew-error";

/// Body sent for every authentication failure, whatever the reason.
pub const UNAUTHORIZED_BODY: &str = "unauthorized";

const INTERNAL_BODY: &str = "internal error";

/// Stable error classes exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A failed request. `message` is shown to the client except for
/// `Unauthorized` and `Internal`, whose bodies are fixed.
#[derive(Debug, Error)]
#[error("{}: {message}", kind.as_str())]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized, UNAUTHORIZED_BODY)
    }

    /// `detail` is for the log only.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, detail)
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    fn public_body(&self) -> String {
        match self.kind {
            ErrorKind::Unauthorized => UNAUTHORIZED_BODY.to_string(),
            ErrorKind::Internal => INTERNAL_BODY.to_string(),
            _ => self.message.clone(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Denied(denial) => Self::new(ErrorKind::Forbidden, denial.to_string()),
            e @ ServiceError::NotFound { .. } => Self::new(ErrorKind::NotFound, e.to_string()),
            ServiceError::Validation(e) => Self::validation(e.to_string()),
            ServiceError::Database(e) => Self::internal(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(error: DatabaseError) -> Self {
        Self::internal(error.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.kind.status(), self.public_body()).into_response();
        response.headers_mut().insert(
            ERROR_KIND_HEADER,
            HeaderValue::from_static(self.kind.as_str()),
        );
        response
    }
}
