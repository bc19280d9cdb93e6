//! Signed bearer tokens.
//!
//! Format: `v1.<merchant_id>.<expires_unix>.<hex hmac-sha256>`, where the MAC
//! covers everything before the last dot.

use chrono::{DateTime, Duration, Utc};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use storekeep_core::MerchantId;

use super::AuthError;

type HmacSha256 = Hmac<Sha256>;

const VERSION: &str = "v1";

/// Issues and verifies merchant bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
    keyed: HmacSha256,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl TokenSigner {
    /// Key a signer with `secret`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLength` if the key is rejected by HMAC (never for
    /// SHA-256, which accepts any key length).
    pub fn new(secret: &SecretString) -> Result<Self, InvalidLength> {
        let keyed = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())?;
        Ok(Self { keyed })
    }

    fn mac(&self) -> HmacSha256 {
        self.keyed.clone()
    }

    /// Issue a token for `merchant_id` that expires after `ttl`.
    #[must_use]
    pub fn issue(&self, merchant_id: MerchantId, ttl: Duration) -> String {
        self.issue_until(merchant_id, Utc::now() + ttl)
    }

    /// Issue a token for `merchant_id` that expires at `expires_at`.
    #[must_use]
    pub fn issue_until(&self, merchant_id: MerchantId, expires_at: DateTime<Utc>) -> String {
        let payload = format!("{VERSION}.{merchant_id}.{}", expires_at.timestamp());
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        format!("{payload}.{signature}")
    }

    /// Verify a token and return the merchant it was issued for.
    ///
    /// # Errors
    ///
    /// `InvalidToken` if the token is malformed or the signature does not
    /// match, `ExpiredToken` if it is past its expiry.
    pub fn verify(&self, token: &str) -> Result<MerchantId, AuthError> {
        self.verify_at(token, Utc::now())
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<MerchantId, AuthError> {
        let (payload, signature) = token.rsplit_once('.').ok_or(AuthError::InvalidToken)?;
        let signature = hex::decode(signature).map_err(|_| AuthError::InvalidToken)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let mut parts = payload.split('.');
        let (Some(VERSION), Some(merchant), Some(expires), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken);
        };

        let merchant_id: MerchantId = merchant.parse().map_err(|_| AuthError::InvalidToken)?;
        let expires: i64 = expires.parse().map_err(|_| AuthError::InvalidToken)?;
        if now.timestamp() >= expires {
            return Err(AuthError::ExpiredToken);
        }

        Ok(merchant_id)
    }
}
