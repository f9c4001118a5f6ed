//! Custom error types for the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// A single field validation failure
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Custom error type for the authentication service
///
/// Repository errors bubble up unchanged inside `Internal`; the service
/// layer translates domain conditions into the dedicated variants, and the
/// `IntoResponse` impl owns the mapping to HTTP status codes.
#[derive(Error, Debug)]
pub enum AuthError {
    /// A resource with the same unique key already exists
    #[error("User already exists")]
    AlreadyExists,

    /// Referenced entity is absent
    #[error("Not found")]
    NotFound,

    /// Credential verification failed
    ///
    /// The response body is identical to the unknown-user case so clients
    /// cannot enumerate accounts.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Request payload failed validation
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Missing, invalid, or insufficient session
    #[error("Unauthorized")]
    Unauthorized,

    /// Any other failure; details are logged, never returned to the client
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AuthError::AlreadyExists => (
                StatusCode::BAD_REQUEST,
                json!({"error": "User already exists"}),
            ),
            AuthError::NotFound => (StatusCode::NOT_FOUND, json!({"error": "Not found"})),
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({"error": "User not found"}),
            ),
            AuthError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                json!({"error": "Validation failed", "fields": fields}),
            ),
            AuthError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, json!({"error": "Unauthorized"}))
            }
            AuthError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "Internal server error"}),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for authentication results
pub type AuthResult<T> = Result<T, AuthError>;
