//! Bearer token command.
//!
//! # Usage
//!
//! ```bash
//! storekeep token issue --merchant-id 42 --ttl-hours 24
//! ```
//!
//! # Environment Variables
//!
//! - `STOREKEEP_TOKEN_SECRET` - signing secret shared with the server

use chrono::Duration;
use secrecy::SecretString;

use storekeep_core::MerchantId;
use storekeep_server::config::{ConfigError, validate_token_secret};
use storekeep_server::services::TokenSigner;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Missing environment variable: STOREKEEP_TOKEN_SECRET")]
    MissingSecret,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("TTL must be between 1 and {max} hours (got {0})", max = MAX_TTL_HOURS)]
    InvalidTtl(i64),

    #[error("Invalid signing key: {0}")]
    Key(String),
}

/// One year.
const MAX_TTL_HOURS: i64 = 24 * 365;

fn sign(secret: &str, merchant_id: i64, ttl_hours: i64) -> Result<String, TokenError> {
    validate_token_secret(secret)?;
    if !(1..=MAX_TTL_HOURS).contains(&ttl_hours) {
        return Err(TokenError::InvalidTtl(ttl_hours));
    }

    let signer = TokenSigner::new(&SecretString::from(secret.to_string()))
        .map_err(|e| TokenError::Key(e.to_string()))?;
    Ok(signer.issue(MerchantId::new(merchant_id), Duration::hours(ttl_hours)))
}

/// Print a signed bearer token for `merchant_id`.
///
/// # Errors
///
/// Returns an error if the secret is missing or weak, or the TTL is out of range.
pub fn issue(merchant_id: i64, ttl_hours: i64) -> Result<(), TokenError> {
    dotenvy::dotenv().ok();

    let secret = std::env::var("STOREKEEP_TOKEN_SECRET").map_err(|_| TokenError::MissingSecret)?;
    let token = sign(&secret, merchant_id, ttl_hours)?;

    tracing::info!(merchant_id, ttl_hours, "Issued bearer token");
    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    Ok(())
}
