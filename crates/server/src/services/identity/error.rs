//! Identity error types.

use thiserror::Error;

/// Errors that can occur while resolving the calling merchant.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No session and no bearer token on the request.
    #[error("authentication required")]
    MissingCredentials,

    /// Bearer token is malformed or its signature does not verify.
    #[error("invalid token")]
    InvalidToken,

    /// Bearer token signature is valid but it has expired.
    #[error("token expired")]
    ExpiredToken,

    /// Session store could not be read.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}
