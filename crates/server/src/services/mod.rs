//! Business logic services.
//!
//! # Services
//!
//! - `inventory` - Store and item lifecycle, scoped to the calling merchant
//! - `identity` - Resolving the calling merchant (session or bearer token)

pub mod identity;
pub mod inventory;

pub use identity::{
    AuthError, BearerTokenIdentity, ChainIdentity, IdentityResolver, SessionIdentity, TokenSigner,
};
pub use inventory::{InventoryService, ServiceError};
