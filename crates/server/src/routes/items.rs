//! Item API handlers.
//!
//! Every route carries the store id; an item is only reachable through the
//! store it belongs to.

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, patch, post},
};
use serde::Serialize;

use storekeep_core::ItemId;

use super::extract::{ApiJson, ApiPath, parse_item_id, parse_store_id};
use super::stores::Ack;
use crate::error::Result;
use crate::middleware::RequireMerchant;
use crate::models::{CreateItem, Item, ItemPatch};
use crate::state::AppState;

/// Build the item router (mounted under `/item`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add/{store_id}", post(add))
        .route("/view/{store_id}/{item_id}", get(view))
        .route("/update/{store_id}/{item_id}", patch(update))
        .route("/remove/{store_id}/{item_id}", delete(remove))
}

/// Response body for a created item.
#[derive(Debug, Serialize)]
pub struct ItemCreated {
    pub status: &'static str,
    pub message: &'static str,
    pub item_id: ItemId,
}

/// Response body for a single item.
#[derive(Debug, Serialize)]
pub struct ItemDetail {
    pub status: &'static str,
    pub item: Item,
}

/// Add an item to one of the caller's stores.
///
/// # Errors
///
/// 400 on a malformed id or body (negative or over-precise price included),
/// 404 if the store is not the caller's.
pub async fn add(
    RequireMerchant(merchant): RequireMerchant,
    State(state): State<AppState>,
    ApiPath(store_id): ApiPath<String>,
    ApiJson(body): ApiJson<CreateItem>,
) -> Result<Json<ItemCreated>> {
    let store_id = parse_store_id(&store_id)?;
    let item_id = state
        .inventory()
        .create_item(merchant, store_id, body)
        .await?;
    Ok(Json(ItemCreated {
        status: "success",
        message: "Item added successfully",
        item_id,
    }))
}

/// View a single item through its store.
///
/// # Errors
///
/// 400 on a malformed id, 404 if the item is not in the caller's store.
pub async fn view(
    RequireMerchant(merchant): RequireMerchant,
    State(state): State<AppState>,
    ApiPath((store_id, item_id)): ApiPath<(String, String)>,
) -> Result<Json<ItemDetail>> {
    let store_id = parse_store_id(&store_id)?;
    let item_id = parse_item_id(&item_id)?;
    let item = state
        .inventory()
        .view_item(merchant, store_id, item_id)
        .await?;
    Ok(Json(ItemDetail {
        status: "success",
        item,
    }))
}

/// Patch any of name, description, availability and price of an item.
///
/// # Errors
///
/// 400 on a malformed id or body, 404 if the item is not in the caller's store.
pub async fn update(
    RequireMerchant(merchant): RequireMerchant,
    State(state): State<AppState>,
    ApiPath((store_id, item_id)): ApiPath<(String, String)>,
    ApiJson(body): ApiJson<ItemPatch>,
) -> Result<Json<Ack>> {
    let store_id = parse_store_id(&store_id)?;
    let item_id = parse_item_id(&item_id)?;
    state
        .inventory()
        .update_item(merchant, store_id, item_id, body)
        .await?;
    Ok(Ack::success("Item updated successfully"))
}

/// Delete an item from one of the caller's stores.
///
/// # Errors
///
/// 400 on a malformed id, 404 if the item is not in the caller's store.
pub async fn remove(
    RequireMerchant(merchant): RequireMerchant,
    State(state): State<AppState>,
    ApiPath((store_id, item_id)): ApiPath<(String, String)>,
) -> Result<Json<Ack>> {
    let store_id = parse_store_id(&store_id)?;
    let item_id = parse_item_id(&item_id)?;
    state
        .inventory()
        .delete_item(merchant, store_id, item_id)
        .await?;
    Ok(Ack::success("Item removed successfully"))
}
