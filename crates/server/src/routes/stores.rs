//! Store API handlers.

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, patch, post},
};
use serde::Serialize;

use storekeep_core::StoreId;

use super::extract::{ApiJson, ApiPath, parse_store_id};
use crate::error::Result;
use crate::middleware::RequireMerchant;
use crate::models::{CreateStore, Store, StorePatch, StoreView};
use crate::state::AppState;

/// Build the store router (mounted under `/store`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add", post(add))
        .route("/list", get(list))
        .route("/update/{store_id}", patch(update))
        .route("/remove/{store_id}", delete(remove))
        .route("/view/{store_id}", get(view))
}

#[derive(Debug, Serialize)]
pub struct StoreCreated {
    pub status: &'static str,
    pub store_id: StoreId,
}

#[derive(Debug, Serialize)]
pub struct StoreList {
    pub status: &'static str,
    pub stores: Vec<Store>,
}

#[derive(Debug, Serialize)]
pub struct StoreDetail {
    pub status: &'static str,
    pub store: StoreView,
}

/// Plain `{status, message}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub status: &'static str,
    pub message: &'static str,
}

impl Ack {
    pub const fn success(message: &'static str) -> Json<Self> {
        Json(Self {
            status: "success",
            message,
        })
    }
}

/// Create a store owned by the caller.
///
/// # Errors
///
/// 400 on malformed or blank input, 401 without identity.
pub async fn add(
    RequireMerchant(merchant): RequireMerchant,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateStore>,
) -> Result<Json<StoreCreated>> {
    let store_id = state.inventory().create_store(merchant, body).await?;
    Ok(Json(StoreCreated {
        status: "success",
        store_id,
    }))
}

/// List the caller's stores.
///
/// # Errors
///
/// 401 without identity, 500 if the catalog store fails.
pub async fn list(
    RequireMerchant(merchant): RequireMerchant,
    State(state): State<AppState>,
) -> Result<Json<StoreList>> {
    let stores = state.inventory().list_stores(merchant).await?;
    Ok(Json(StoreList {
        status: "success",
        stores,
    }))
}

/// Patch name and/or description of a store.
///
/// # Errors
///
/// 400 on a malformed id or body, 404 if the store is not the caller's.
pub async fn update(
    RequireMerchant(merchant): RequireMerchant,
    State(state): State<AppState>,
    ApiPath(store_id): ApiPath<String>,
    ApiJson(body): ApiJson<StorePatch>,
) -> Result<Json<Ack>> {
    let store_id = parse_store_id(&store_id)?;
    state
        .inventory()
        .update_store(merchant, store_id, body)
        .await?;
    Ok(Ack::success("Store updated successfully"))
}

/// Delete a store and its items.
///
/// # Errors
///
/// 400 on a malformed id, 404 if the store is not the caller's.
pub async fn remove(
    RequireMerchant(merchant): RequireMerchant,
    State(state): State<AppState>,
    ApiPath(store_id): ApiPath<String>,
) -> Result<Json<Ack>> {
    let store_id = parse_store_id(&store_id)?;
    state.inventory().delete_store(merchant, store_id).await?;
    Ok(Ack::success("Store removed successfully"))
}

/// View a store with its items.
///
/// # Errors
///
/// 400 on a malformed id, 404 if the store is not the caller's.
pub async fn view(
    RequireMerchant(merchant): RequireMerchant,
    State(state): State<AppState>,
    ApiPath(store_id): ApiPath<String>,
) -> Result<Json<StoreDetail>> {
    let store_id = parse_store_id(&store_id)?;
    let store = state.inventory().view_store(merchant, store_id).await?;
    Ok(Json(StoreDetail {
        status: "success",
        store,
    }))
}
