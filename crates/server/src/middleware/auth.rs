//! Authentication extractors.
//!
//! Provides an extractor for requiring an authenticated merchant in route
//! handlers. Resolution itself is delegated to the [`IdentityResolver`] held
//! in [`AppState`], so handlers never look at cookies or tokens.
//!
//! [`IdentityResolver`]: crate::services::IdentityResolver

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tower_sessions::Session;

use storekeep_core::MerchantId;

use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentMerchant, session_keys};
use crate::services::AuthError;
use crate::state::AppState;

/// Extractor that requires an authenticated merchant.
///
/// Rejects with 401 when no credentials resolve. List it before any body or
/// path extractor so an unauthenticated request is never reported as a 400.
///
/// # Example
///
/// ```rust,ignore
/// async fn list(
///     RequireMerchant(merchant): RequireMerchant,
///     State(state): State<AppState>,
/// ) -> Result<Json<Value>> {
///     let stores = state.inventory().list_stores(merchant).await?;
///     ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireMerchant(pub MerchantId);

impl<S> FromRequestParts<S> for RequireMerchant
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);

        let merchant = match app.identity().resolve(parts).await {
            Ok(Some(merchant)) => merchant,
            Ok(None) => return Err(AuthError::MissingCredentials.into()),
            Err(err) => {
                tracing::debug!(error = %err, path = %parts.uri.path(), "Identity rejected");
                return Err(err.into());
            }
        };

        set_sentry_user(&merchant);
        Ok(Self(merchant))
    }
}

/// Helper to set the current merchant in the session (login).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_merchant(
    session: &Session,
    merchant: &CurrentMerchant,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::CURRENT_MERCHANT, merchant)
        .await
}

/// Helper to clear the current merchant from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_merchant(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentMerchant>(session_keys::CURRENT_MERCHANT)
        .await?;
    Ok(())
}
