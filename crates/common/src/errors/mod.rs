//! Error types for the plugin sandbox
//!
//! Provides:
//! - Distinct error types for each failure mode
//! - HTTP status code mapping
//! - Flat structured error responses (`{"error": CODE}` plus `perm` on
//!   permission denials, matching the HTTP surface contract)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Request carries no tenant context; fails closed before any database access
    #[error("No tenant context on request")]
    Unauthenticated,

    /// Permission join came back empty
    #[error("Missing required permission: {perm}")]
    Forbidden { perm: String },

    /// Tenant directory has no row for this id
    #[error("Tenant not found: {id}")]
    TenantNotFound { id: String },

    /// Resolved schema name failed identifier validation
    #[error("Invalid schema name: {name}")]
    InvalidIdentifier { name: String },

    /// Client-facing validation failure; `code` is the wire error code
    #[error("Validation failed: {code}")]
    Validation { code: &'static str },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Wire error code for the response body
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "NO_TENANT",
            AppError::Forbidden { .. } => "FORBIDDEN",
            AppError::TenantNotFound { .. } => "TENANT_NOT_FOUND",
            AppError::InvalidIdentifier { .. } => "INVALID_SCHEMA_NAME",
            AppError::Validation { code } => code,
            AppError::Database(_)
            | AppError::Configuration { .. }
            | AppError::Internal { .. }
            | AppError::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::TenantNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidIdentifier { .. }
            | AppError::Database(_)
            | AppError::Configuration { .. }
            | AppError::Internal { .. }
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Flat error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perm: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Server error detail goes to the log, never into the body
        if self.is_server_error() {
            tracing::error!(
                error = %self,
                code = code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %self,
                code = code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let perm = match self {
            AppError::Forbidden { perm } => Some(perm),
            _ => None,
        };

        (status, Json(ErrorResponse { error: code, perm })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::TenantNotFound { id: "t1".into() };
        assert_eq!(err.code(), "TENANT_NOT_FOUND");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unauthenticated_fails_closed_as_401() {
        let err = AppError::Unauthenticated;
        assert_eq!(err.code(), "NO_TENANT");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_forbidden_reports_permission() {
        let err = AppError::Forbidden { perm: "sample.items.create".into() };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        let body = match err {
            AppError::Forbidden { perm } => perm,
            _ => unreachable!(),
        };
        assert_eq!(body, "sample.items.create");
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation { code: "NAME_REQUIRED" };
        assert_eq!(err.code(), "NAME_REQUIRED");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_server_errors_share_generic_code() {
        let err = AppError::Internal { message: "boom".into() };
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert!(err.is_server_error());

        let err = AppError::InvalidIdentifier { name: "bad name".into() };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "INVALID_SCHEMA_NAME");
    }
}
