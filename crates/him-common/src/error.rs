//! Centralized error types for Project HIM.
//!
//! Uses `thiserror` for the variants and converts straight into JSON API
//! responses. Every error propagates to the request boundary unchanged; there
//! is no local recovery and no retry anywhere in the stack.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum HimError {
    // === Startup ===
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // === Auth errors ===
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    // === Resource errors ===
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("{resource} already exists")]
    AlreadyExists { resource: String },

    /// A referenced row is missing, or a delete is blocked by dependent rows.
    #[error("Referential integrity violation: {message}")]
    Referential { message: String },

    #[error("Limit reached: {message}")]
    LimitReached { message: String },

    // === Validation errors ===
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Department-specific data did not match the department's schema.
    #[error("Additional fields invalid at '{path}': {message}")]
    SchemaViolation { path: String, message: String },

    // === Infrastructure errors ===
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body sent to clients.
#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

impl HimError {
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Map error to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::AlreadyExists { .. } | Self::Referential { .. } | Self::LimitReached { .. } => {
                StatusCode::CONFLICT
            }
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::SchemaViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Configuration { .. } | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Error code string for programmatic handling by clients.
    pub fn error_code(&self) -> &str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::Referential { .. } => "REFERENTIAL_ERROR",
            Self::LimitReached { .. } => "LIMIT_REACHED",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::SchemaViolation { .. } => "SCHEMA_VIOLATION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Classify constraint violations so callers see a conflict instead of a 500.
impl From<sqlx::Error> for HimError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            match db.kind() {
                sqlx::error::ErrorKind::UniqueViolation => {
                    return HimError::AlreadyExists {
                        resource: db.table().unwrap_or("Record").to_string(),
                    };
                }
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    return HimError::Referential {
                        message: db.message().to_string(),
                    };
                }
                _ => {}
            }
        }
        HimError::Database(e)
    }
}

/// Malformed bodies, paths and query strings are client errors in the same
/// JSON shape as everything else.
impl From<JsonRejection> for HimError {
    fn from(rejection: JsonRejection) -> Self {
        HimError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for HimError {
    fn from(rejection: PathRejection) -> Self {
        HimError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for HimError {
    fn from(rejection: QueryRejection) -> Self {
        HimError::validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for HimError {
    fn from(rejection: MultipartRejection) -> Self {
        HimError::validation(rejection.body_text())
    }
}

impl IntoResponse for HimError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't leak internal details to clients
        let message = match &self {
            HimError::Database(e) => {
                tracing::error!("Database error: {e}");
                "An internal error occurred".to_string()
            }
            HimError::Internal(e) => {
                tracing::error!("Internal error: {e:#}");
                "An internal error occurred".to_string()
            }
            HimError::Configuration { message } => {
                tracing::error!("Configuration error: {message}");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let path = match &self {
            HimError::SchemaViolation { path, .. } => Some(path.clone()),
            _ => None,
        };

        let body = ErrorResponse {
            code: status.as_u16(),
            error: self.error_code().to_string(),
            message,
            path,
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Convenience type alias for Results using HimError.
pub type HimResult<T> = Result<T, HimError>;
