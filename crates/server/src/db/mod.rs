//! Catalog persistence for stores and items.
//!
//! # Database: `storekeep`
//!
//! ## Tables
//!
//! - `inventory.store` - Stores, one owning `merchant_id` each
//! - `inventory.item` - Items, `store_id` references `inventory.store`
//!   with `ON DELETE CASCADE`
//! - `tower_sessions.session` - Tower-sessions storage (shared with login)
//!
//! # Ownership filters
//!
//! Every read and write below goes through a [`StoreFilter`] or
//! [`ItemFilter`], which always carry the owning merchant. There is no
//! method that addresses a store or item by id alone.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p storekeep-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use storekeep_core::{ItemId, MerchantId, StoreId};

use crate::models::{Item, ItemChanges, Store, StoreChanges};

pub use memory::MemoryCatalogStore;
pub use postgres::PgCatalogStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The call did not finish before its deadline.
    #[error("catalog store call timed out after {0:?}")]
    Timeout(Duration),
}

/// Ownership filter for a single store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreFilter {
    pub merchant_id: MerchantId,
    pub store_id: StoreId,
}

impl StoreFilter {
    #[must_use]
    pub const fn new(merchant_id: MerchantId, store_id: StoreId) -> Self {
        Self {
            merchant_id,
            store_id,
        }
    }

    /// Narrow this filter to one item of the store.
    #[must_use]
    pub const fn item(self, item_id: ItemId) -> ItemFilter {
        ItemFilter {
            store: self,
            item_id,
        }
    }
}

/// Ownership filter for a single item: owner + store + item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemFilter {
    pub store: StoreFilter,
    pub item_id: ItemId,
}

/// Persistent collection of stores and items.
///
/// Each method is a single atomic operation against the backing store.
/// Mutations return the number of documents the filter *matched*, so an
/// update that leaves values unchanged still reports 1. Zero means the
/// resource is absent or owned by someone else; callers cannot tell which.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert a new store.
    async fn insert_store(&self, store: &Store) -> Result<(), RepositoryError>;

    /// Find a store by id, scoped to its owner.
    async fn find_store(&self, filter: StoreFilter) -> Result<Option<Store>, RepositoryError>;

    /// List all stores owned by a merchant, most recent first.
    async fn list_stores(&self, merchant_id: MerchantId) -> Result<Vec<Store>, RepositoryError>;

    /// Merge `changes` into the matching store.
    ///
    /// Empty changes perform no write and report whether the filter matched.
    async fn update_store(
        &self,
        filter: StoreFilter,
        changes: &StoreChanges,
    ) -> Result<u64, RepositoryError>;

    /// Delete the matching store together with all of its items.
    async fn delete_store(&self, filter: StoreFilter) -> Result<u64, RepositoryError>;

    /// Insert an item, but only while its store is owned by `merchant_id`.
    ///
    /// Returns 0 (and writes nothing) if the store is gone or foreign.
    async fn insert_item(
        &self,
        merchant_id: MerchantId,
        item: &Item,
    ) -> Result<u64, RepositoryError>;

    /// Find an item through its owning store.
    async fn find_item(&self, filter: ItemFilter) -> Result<Option<Item>, RepositoryError>;

    /// List the items of a store, oldest first.
    async fn list_items(&self, filter: StoreFilter) -> Result<Vec<Item>, RepositoryError>;

    /// Merge `changes` into the matching item.
    ///
    /// Empty changes perform no write and report whether the filter matched.
    async fn update_item(
        &self,
        filter: ItemFilter,
        changes: &ItemChanges,
    ) -> Result<u64, RepositoryError>;

    /// Delete the matching item.
    async fn delete_item(&self, filter: ItemFilter) -> Result<u64, RepositoryError>;

    /// Check that the backing store is reachable.
    async fn health_check(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
