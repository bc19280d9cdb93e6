//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`, and every failure body has the shape
//! `{"status": "error", "error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::{AuthError, ServiceError};

/// Application-level error type for the inventory API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Inventory operation failed.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Identity could not be resolved.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Bad request from client (malformed JSON or identifiers).
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether this error is the server's fault.
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Service(ServiceError::Persistence(_)) | Self::Auth(AuthError::Session(_))
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Service(err) => match err {
                ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                ServiceError::StoreNotFound | ServiceError::ItemNotFound => StatusCode::NOT_FOUND,
                ServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(AuthError::Session(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> String {
        // Don't expose internal error details to clients
        if self.is_server_error() {
            return "Internal server error".to_string();
        }

        match self {
            Self::Service(ServiceError::Validation(msg)) | Self::BadRequest(msg) => msg.clone(),
            Self::Service(ServiceError::StoreNotFound) => {
                "Store not found or unauthorized".to_string()
            }
            Self::Service(ServiceError::ItemNotFound) => {
                "Item not found or unauthorized".to_string()
            }
            Self::Auth(AuthError::InvalidToken) => "Invalid token".to_string(),
            Self::Auth(AuthError::ExpiredToken) => "Token expired".to_string(),
            _ => "Unauthorized".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = json!({
            "status": "error",
            "error": self.message(),
        });

        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context to the calling merchant.
///
/// Called once identity has resolved so errors are associated with merchants.
pub fn set_sentry_user(merchant_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(merchant_id.to_string()),
            ..Default::default()
        }));
    });
}
