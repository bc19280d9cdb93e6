//! Item domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storekeep_core::{Description, ItemId, Name, Price, StoreId};

/// An item offered by a store (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    /// Unique item ID, generated on creation.
    pub id: ItemId,
    /// Store this item belongs to. Never changes after creation.
    pub store_id: StoreId,
    /// Display name.
    pub name: Name,
    /// Free-form description.
    pub description: Description,
    /// Whether the item can currently be ordered.
    pub available: bool,
    /// Unit price.
    pub price: Price,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
    /// When the item was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Build a fresh item belonging to `store_id`.
    #[must_use]
    pub fn new(store_id: StoreId, fields: NewItem) -> Self {
        let now = Utc::now();
        Self {
            id: ItemId::generate(),
            store_id,
            name: fields.name,
            description: fields.description,
            available: fields.available,
            price: fields.price,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a sparse set of changes in place.
    pub fn apply(&mut self, changes: &ItemChanges) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        if let Some(available) = changes.available {
            self.available = available;
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if !changes.is_empty() {
            self.updated_at = Utc::now();
        }
    }
}

/// Request body for creating an item. Every field is required.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateItem {
    pub name: String,
    pub description: String,
    pub available: bool,
    #[serde(deserialize_with = "storekeep_core::price::exact::deserialize")]
    pub price: Decimal,
}

/// Request body for a partial item update.
///
/// `available: false` and `price: 0` are real values here, distinct from an
/// absent field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default, deserialize_with = "storekeep_core::price::exact::option")]
    pub price: Option<Decimal>,
}

/// Validated fields for a new item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: Name,
    pub description: Description,
    pub available: bool,
    pub price: Price,
}

/// Validated sparse changes to an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    pub name: Option<Name>,
    pub description: Option<Description>,
    pub available: Option<bool>,
    pub price: Option<Price>,
}

impl ItemChanges {
    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.available.is_none()
            && self.price.is_none()
    }
}
