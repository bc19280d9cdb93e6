//! Request extractors whose rejections use the API error envelope.

use axum::extract::{FromRequest, FromRequestParts};

use storekeep_core::{ItemId, StoreId};

use crate::error::AppError;

/// `axum::Json` with rejections mapped to a 400 `AppError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with rejections mapped to a 400 `AppError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

pub fn parse_store_id(raw: &str) -> Result<StoreId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid store ID format".to_string()))
}

pub fn parse_item_id(raw: &str) -> Result<ItemId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid item ID format".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids() {
        assert!(parse_store_id("67c1f1a2-9e0b-4d3c-8f5a-1b2c3d4e5f60").is_ok());
        assert!(matches!(
            parse_store_id("not-a-uuid"),
            Err(AppError::BadRequest(msg)) if msg == "Invalid store ID format"
        ));
        assert!(matches!(
            parse_item_id(""),
            Err(AppError::BadRequest(msg)) if msg == "Invalid item ID format"
        ));
    }
}
