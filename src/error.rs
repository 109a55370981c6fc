//!
//! # Custom Error Handling
//!
//! Defines `AppError`, the single error type flowing through every handler, and
//! its mapping onto the API's JSON response envelope
//! (`{"success": false, "message": ...}`).
//!
//! `AppError` implements `actix_web::error::ResponseError`, so handlers can
//! simply return `Result<_, AppError>` and rely on `?`. `From` impls cover
//! `sqlx::Error`, `validator::ValidationErrors`, `jsonwebtoken::errors::Error`
//! and `bcrypt::BcryptError`. Store and primitive failures are logged
//! server-side and surfaced to the client as generic messages.

use actix_web::{
    error::{JsonPayloadError, ResponseError},
    http::StatusCode,
    HttpRequest, HttpResponse,
};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::validation::first_validation_message;

/// All failure modes a request can produce.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or semantically invalid request payload (HTTP 400).
    BadRequest(String),
    /// Input failed schema validation; carries the first failing field's
    /// message (HTTP 400).
    Validation(String),
    /// Duplicate username or email on registration. Surfaced as HTTP 400 to
    /// match the API contract rather than 409.
    Conflict(String),
    /// Missing, invalid or expired credentials (HTTP 401).
    Unauthorized(String),
    /// Authenticated, but neither the owner of the target task nor an admin
    /// (HTTP 403).
    Forbidden(String),
    /// Referenced entity does not exist (HTTP 404).
    NotFound(String),
    /// Unexpected server-side failure (HTTP 500).
    Internal(String),
    /// Store failure (HTTP 500). The wrapped detail is logged, never sent to
    /// the client.
    Database(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation Error: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::Database(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::BadRequest(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::Internal(msg) => {
                log::error!("internal error: {}", msg);
                "Server error".to_string()
            }
            AppError::Database(msg) => {
                log::error!("database error: {}", msg);
                "Database error".to_string()
            }
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": message
        }))
    }
}

/// Json extractor error handler, registered via `web::JsonConfig`.
///
/// Keeps body-deserialization failures (malformed JSON, missing fields,
/// unknown enum variants) inside the response envelope instead of actix's
/// plain-text default.
pub fn json_error_handler(error: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(error.to_string()).into()
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::Database(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        AppError::Validation(first_validation_message(&errors))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized("Token is invalid or expired".into())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::Internal(error.to_string())
    }
}
