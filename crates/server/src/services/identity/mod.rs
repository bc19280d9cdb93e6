//! Resolving the calling merchant from a request.
//!
//! Credentials come from two places:
//!
//! - the login session (`current_merchant` key, written by whatever login
//!   flow fronts this service)
//! - an `Authorization: Bearer` token issued by [`TokenSigner`]
//!
//! [`ChainIdentity`] tries resolvers in order and the first one that finds
//! credentials decides the outcome.

mod error;
mod token;

pub use error::AuthError;
pub use token::TokenSigner;

use async_trait::async_trait;
use axum::http::{header, request::Parts};
use tower_sessions::Session;

use storekeep_core::MerchantId;

use crate::models::{CurrentMerchant, session_keys};

/// Source of the authenticated merchant for a request.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve the merchant making this request.
    ///
    /// `Ok(None)` means this resolver found no credentials of its kind;
    /// an error means credentials were present but unusable.
    async fn resolve(&self, parts: &Parts) -> Result<Option<MerchantId>, AuthError>;
}

/// Reads the merchant from the tower-sessions session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionIdentity;

#[async_trait]
impl IdentityResolver for SessionIdentity {
    async fn resolve(&self, parts: &Parts) -> Result<Option<MerchantId>, AuthError> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(None);
        };

        let merchant: Option<CurrentMerchant> =
            session.get(session_keys::CURRENT_MERCHANT).await?;
        Ok(merchant.map(|m| m.id))
    }
}

/// Verifies `Authorization: Bearer <token>` headers.
#[derive(Debug, Clone)]
pub struct BearerTokenIdentity {
    signer: TokenSigner,
}

impl BearerTokenIdentity {
    #[must_use]
    pub const fn new(signer: TokenSigner) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl IdentityResolver for BearerTokenIdentity {
    async fn resolve(&self, parts: &Parts) -> Result<Option<MerchantId>, AuthError> {
        let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(None);
        };

        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(AuthError::InvalidToken)?;

        self.signer.verify(token).map(Some)
    }
}

/// Tries each resolver in turn.
#[derive(Default)]
pub struct ChainIdentity {
    resolvers: Vec<Box<dyn IdentityResolver>>,
}

impl ChainIdentity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resolver to the chain.
    #[must_use]
    pub fn with(mut self, resolver: impl IdentityResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }
}

#[async_trait]
impl IdentityResolver for ChainIdentity {
    async fn resolve(&self, parts: &Parts) -> Result<Option<MerchantId>, AuthError> {
        for resolver in &self.resolvers {
            if let Some(merchant) = resolver.resolve(parts).await? {
                return Ok(Some(merchant));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use chrono::Duration;
    use secrecy::SecretString;
    use tower_sessions::MemoryStore;

    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(&SecretString::from(
            "k7Qp2xVb9LmZr4TnWc8HsJd3FgYa6EuR".to_string(),
        ))
        .unwrap()
    }

    fn parts(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/store/list");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn chain() -> ChainIdentity {
        ChainIdentity::new()
            .with(SessionIdentity)
            .with(BearerTokenIdentity::new(signer()))
    }

    #[tokio::test]
    async fn test_no_credentials() {
        assert_eq!(chain().resolve(&parts(None)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_bearer_token() {
        let token = signer().issue(MerchantId::new(7), Duration::hours(1));
        let resolved = chain()
            .resolve(&parts(Some(&format!("Bearer {token}"))))
            .await
            .unwrap();
        assert_eq!(resolved, Some(MerchantId::new(7)));
    }

    #[tokio::test]
    async fn test_bad_scheme_is_invalid() {
        let err = chain()
            .resolve(&parts(Some("Basic dXNlcjpwYXNz")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_session_wins_over_token() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        session
            .insert(
                session_keys::CURRENT_MERCHANT,
                CurrentMerchant {
                    id: MerchantId::new(3),
                },
            )
            .await
            .unwrap();

        let token = signer().issue(MerchantId::new(9), Duration::hours(1));
        let mut parts = parts(Some(&format!("Bearer {token}")));
        parts.extensions.insert(session);

        assert_eq!(
            chain().resolve(&parts).await.unwrap(),
            Some(MerchantId::new(3))
        );
    }

    #[tokio::test]
    async fn test_empty_session_falls_through() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut parts = parts(None);
        parts.extensions.insert(session);

        assert_eq!(chain().resolve(&parts).await.unwrap(), None);
    }
}
