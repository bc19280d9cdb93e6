//! Store domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storekeep_core::{Description, MerchantId, Name, StoreId};

use super::item::Item;

/// A merchant's store (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Store {
    /// Unique store ID, generated on creation.
    pub id: StoreId,
    /// Owning merchant. Never changes after creation.
    pub merchant_id: MerchantId,
    /// Display name.
    pub name: Name,
    /// Free-form description.
    pub description: Description,
    /// Whether the store is published. Always `false` at creation.
    pub available: bool,
    /// When the store was created.
    pub created_at: DateTime<Utc>,
    /// When the store was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Store {
    /// Build a fresh, unpublished store for `merchant_id`.
    #[must_use]
    pub fn new(merchant_id: MerchantId, fields: NewStore) -> Self {
        let now = Utc::now();
        Self {
            id: StoreId::generate(),
            merchant_id,
            name: fields.name,
            description: fields.description,
            available: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a sparse set of changes in place.
    pub fn apply(&mut self, changes: &StoreChanges) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        if !changes.is_empty() {
            self.updated_at = Utc::now();
        }
    }
}

/// A store together with its items, as returned by the view endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StoreView {
    #[serde(flatten)]
    pub store: Store,
    pub items: Vec<Item>,
}

/// Request body for creating a store.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStore {
    pub name: String,
    pub description: String,
}

/// Request body for a partial store update.
///
/// A field that is absent (or `null`) is left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Validated fields for a new store.
#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: Name,
    pub description: Description,
}

/// Validated sparse changes to a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreChanges {
    pub name: Option<Name>,
    pub description: Option<Description>,
}

impl StoreChanges {
    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}
