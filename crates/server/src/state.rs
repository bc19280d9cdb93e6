//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::CatalogStore;
use crate::services::{
    BearerTokenIdentity, ChainIdentity, IdentityResolver, InventoryService, SessionIdentity,
    TokenSigner,
};

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid token secret: {0}")]
    TokenSecret(#[from] hmac::digest::InvalidLength),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// inventory service and the identity resolver.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    inventory: InventoryService,
    identity: Arc<dyn IdentityResolver>,
}

impl AppState {
    /// Create application state with the default identity chain.
    ///
    /// Sessions are always consulted; bearer tokens are accepted only when
    /// the config carries a token secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the token signer cannot be keyed.
    pub fn new(config: ServerConfig, catalog: Arc<dyn CatalogStore>) -> Result<Self, StateError> {
        let mut chain = ChainIdentity::new().with(SessionIdentity);
        if let Some(secret) = &config.token_secret {
            chain = chain.with(BearerTokenIdentity::new(TokenSigner::new(secret)?));
        }
        Ok(Self::with_identity(config, catalog, Arc::new(chain)))
    }

    /// Create application state with an explicit identity resolver.
    #[must_use]
    pub fn with_identity(
        config: ServerConfig,
        catalog: Arc<dyn CatalogStore>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        let inventory = InventoryService::new(catalog, config.store_timeout);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                inventory,
                identity,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the inventory service.
    #[must_use]
    pub fn inventory(&self) -> &InventoryService {
        &self.inner.inventory
    }

    /// Get a reference to the identity resolver.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityResolver {
        self.inner.identity.as_ref()
    }
}
