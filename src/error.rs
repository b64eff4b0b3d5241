// Admin error taxonomy
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use thiserror::Error;

use crate::database::DatabaseError;
use crate::routes::Action;
use crate::session::SessionError;

/// Errors surfaced by the dispatcher and its action handlers
#[derive(Debug, Error)]
pub enum AdminError {
    // Configuration errors
    #[error("route missing: {}", .0.name())]
    MissingRoute(Action),

    #[error("unknown route name: {0}")]
    UnknownRoute(String),

    #[error("route path bound twice: {0}")]
    DuplicateRoute(String),

    #[error("route path must start with '/': {0:?}")]
    InvalidRoutePath(String),

    #[error("database session not configured")]
    SessionMissing,

    // Lookup misses
    #[error("invalid collection key: {0}")]
    InvalidCollectionKey(String),

    #[error("type not registered with the admin: {0}")]
    UnregisteredType(&'static str),

    #[error("not found: {0}")]
    NotFound(String),

    // Per-request errors
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdminError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdminError::InvalidCollectionKey(_) | AdminError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AdminError::Unauthorized => StatusCode::UNAUTHORIZED,
            AdminError::NotFound(_) => StatusCode::NOT_FOUND,
            AdminError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AdminError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AdminError::Database(DatabaseError::NotFound(_)) => StatusCode::NOT_FOUND,
            AdminError::Database(DatabaseError::ConnectionError(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AdminError::MissingRoute(_)
            | AdminError::UnknownRoute(_)
            | AdminError::DuplicateRoute(_)
            | AdminError::InvalidRoutePath(_)
            | AdminError::SessionMissing
            | AdminError::UnregisteredType(_)
            | AdminError::Session(_)
            | AdminError::Database(_)
            | AdminError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            AdminError::MissingRoute(_)
            | AdminError::UnknownRoute(_)
            | AdminError::DuplicateRoute(_)
            | AdminError::InvalidRoutePath(_) => "ROUTE_CONFIGURATION",
            AdminError::SessionMissing => "SESSION_MISSING",
            AdminError::InvalidCollectionKey(_) => "INVALID_COLLECTION",
            AdminError::UnregisteredType(_) => "UNREGISTERED_TYPE",
            AdminError::NotFound(_) => "NOT_FOUND",
            AdminError::BadRequest(_) => "BAD_REQUEST",
            AdminError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            AdminError::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            AdminError::Unauthorized => "UNAUTHORIZED",
            AdminError::Session(_) => "SESSION_ERROR",
            AdminError::Database(DatabaseError::NotFound(_)) => "NOT_FOUND",
            AdminError::Database(_) => "DATABASE_ERROR",
            AdminError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Get client-safe error message. Server-side failures are not echoed back.
    pub fn message(&self) -> String {
        match self {
            AdminError::Database(DatabaseError::NotFound(msg)) => msg.clone(),
            AdminError::Database(DatabaseError::ConnectionError(_)) => {
                "Database temporarily unavailable".to_string()
            }
            AdminError::Database(_) => "Database error occurred".to_string(),
            AdminError::Session(_) => "Unable to issue session".to_string(),
            _ => self.to_string(),
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        })
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            // Log the real error but return generic message
            tracing::error!("admin request failed: {}", self);
        }
        (status, Json(self.to_json())).into_response()
    }
}
