//! Session-related types.
//!
//! Types stored in the session for authentication state. The session row is
//! written by the merchant login flow, which shares the session table.

use serde::{Deserialize, Serialize};

use storekeep_core::MerchantId;

/// Session-stored merchant identity.
///
/// Minimal data stored in the session to identify the logged-in merchant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentMerchant {
    /// Merchant's ID as issued by the identity provider.
    pub id: MerchantId,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in merchant.
    pub const CURRENT_MERCHANT: &str = "current_merchant";
}
