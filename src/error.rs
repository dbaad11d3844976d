//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! It centralizes the error taxonomy: validation failures (400), missing credentials (401),
//! bad or expired credentials (403), missing or unowned resources (404), uniqueness
//! conflicts (409), and unexpected storage/runtime failures (500).
//!
//! `AppError` implements `actix_web::error::ResponseError` to seamlessly convert
//! application errors into appropriate HTTP responses with JSON bodies, so handlers
//! and middleware can use the `?` operator throughout. Storage-layer constraint
//! violations are translated into taxonomy entries rather than leaking raw error codes.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Represents all possible errors that can occur within the application.
///
/// Each variant corresponds to a specific failure category and HTTP status code.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or out-of-range input (HTTP 400).
    Validation(String),
    /// No credential was presented where one is required (HTTP 401).
    /// Also used for uniform login failures.
    Unauthenticated(String),
    /// A credential was presented but is malformed, badly signed, or expired (HTTP 403).
    Forbidden(String),
    /// The requested resource does not exist or is not owned by the requester (HTTP 404).
    NotFound(String),
    /// A uniqueness constraint would be violated (HTTP 409).
    Conflict(String),
    /// An unexpected server-side error (HTTP 500). The message is logged, not returned.
    Internal(String),
    /// An error originating from database operations (HTTP 500).
    /// Wraps errors from the `sqlx` crate; the detail is logged, not returned.
    Database(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation Error: {}", msg),
            AppError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::Database(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// Every failure path renders a structured body with a stable `error` field.
/// Internal and database errors log their detail server-side and return a
/// generic message to the client.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(msg)
            | AppError::Unauthenticated(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => {
                HttpResponse::build(self.status_code()).json(json!({ "error": msg }))
            }
            AppError::Internal(_) | AppError::Database(_) => {
                log::error!("{}", self);
                HttpResponse::build(self.status_code())
                    .json(json!({ "error": "Internal server error" }))
            }
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` maps to `NotFound`; Postgres constraint violations are translated
/// by SQLSTATE code (unique -> Conflict, foreign-key / not-null -> Validation);
/// everything else, including pool acquisition timeouts, becomes `Database`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match &error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => AppError::Conflict("Duplicate entry".into()),
                Some("23503") => AppError::Validation("Referenced record not found".into()),
                Some("23502") => AppError::Validation("Required field missing".into()),
                _ => AppError::Database(error.to_string()),
            },
            _ => AppError::Database(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::Validation`.
///
/// The detailed validation messages are preserved.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::Validation(error.to_string())
    }
}

/// Converts `jsonwebtoken::errors::Error` into `AppError::Forbidden`.
///
/// A token that fails processing was *presented* but is invalid or expired,
/// which is the 403 half of the 401/403 asymmetry.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Forbidden(format!("Invalid or expired token: {}", error))
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::Internal`.
///
/// This handles errors during password hashing or verification.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::Internal(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_responses() {
        // Test Validation
        let error = AppError::Validation("Invalid input".into());
        let response = error.error_response();
        assert_eq!(response.status(), 400);

        // Test Unauthenticated
        let error = AppError::Unauthenticated("No token provided".into());
        let response = error.error_response();
        assert_eq!(response.status(), 401);

        // Test Forbidden
        let error = AppError::Forbidden("Invalid or expired token".into());
        let response = error.error_response();
        assert_eq!(response.status(), 403);

        // Test NotFound
        let error = AppError::NotFound("Resource not found".into());
        let response = error.error_response();
        assert_eq!(response.status(), 404);

        // Test Conflict
        let error = AppError::Conflict("Duplicate entry".into());
        let response = error.error_response();
        assert_eq!(response.status(), 409);

        // Test Internal
        let error = AppError::Internal("Server error".into());
        let response = error.error_response();
        assert_eq!(response.status(), 500);
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error: AppError = sqlx::Error::RowNotFound.into();
        match error {
            AppError::NotFound(_) => {}
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_jwt_error_maps_to_forbidden() {
        let jwt_error = jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::ExpiredSignature,
        );
        let error: AppError = jwt_error.into();
        match error {
            AppError::Forbidden(msg) => assert!(msg.contains("Invalid or expired token")),
            other => panic!("Expected Forbidden, got {:?}", other),
        }
    }
}
