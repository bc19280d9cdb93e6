//! Ownership-scoped store and item lifecycle.
//!
//! Every operation takes the caller's [`MerchantId`] and builds a
//! [`StoreFilter`] (or an [`ItemFilter`](crate::db::ItemFilter)) from it, so
//! no code path can address a resource without its owner. Item operations first re-check that the
//! store belongs to the caller, then run a write that repeats the ownership
//! condition, so a concurrent store delete still ends in `NotFound`.
//!
//! A resource that is missing and one that belongs to another merchant
//! produce the same error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use storekeep_core::{
    Description, ItemId, MerchantId, Name, Price, PriceError, StoreId, TextError,
};

use crate::db::{CatalogStore, RepositoryError, StoreFilter};
use crate::models::{
    CreateItem, CreateStore, Item, ItemChanges, ItemPatch, NewItem, NewStore, Store, StoreChanges,
    StorePatch, StoreView,
};

/// Errors returned by [`InventoryService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller input is missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Store is absent or not owned by the caller.
    #[error("store not found")]
    StoreNotFound,

    /// Item is absent, in another store, or not owned by the caller.
    #[error("item not found")]
    ItemNotFound,

    /// The catalog store failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] RepositoryError),
}

impl From<TextError> for ServiceError {
    fn from(err: TextError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PriceError> for ServiceError {
    fn from(err: PriceError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type alias for `ServiceError`.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Store and item operations scoped to the calling merchant.
#[derive(Clone)]
pub struct InventoryService {
    catalog: Arc<dyn CatalogStore>,
    deadline: Duration,
}

impl InventoryService {
    /// Create a service over a catalog store.
    ///
    /// `deadline` bounds every individual catalog store call.
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogStore>, deadline: Duration) -> Self {
        Self { catalog, deadline }
    }

    /// Run one catalog store call under the configured deadline.
    async fn call<T>(
        &self,
        op: impl Future<Output = std::result::Result<T, RepositoryError>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.deadline, op).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(RepositoryError::Timeout(self.deadline).into()),
        }
    }

    /// Load a store the caller owns, or fail with `StoreNotFound`.
    async fn owned_store(&self, filter: StoreFilter) -> Result<Store> {
        self.call(self.catalog.find_store(filter))
            .await?
            .ok_or(ServiceError::StoreNotFound)
    }

    // =========================================================================
    // Stores
    // =========================================================================

    /// Create a store owned by `owner`. New stores start unavailable.
    ///
    /// # Errors
    ///
    /// `Validation` if `name` or `description` is blank, `Persistence` if
    /// the write fails.
    pub async fn create_store(&self, owner: MerchantId, cmd: CreateStore) -> Result<StoreId> {
        let fields = NewStore {
            name: Name::parse(&cmd.name)?,
            description: Description::parse(&cmd.description)?,
        };
        let store = Store::new(owner, fields);

        self.call(self.catalog.insert_store(&store)).await?;

        tracing::info!(merchant_id = %owner, store_id = %store.id, "Store created");
        Ok(store.id)
    }

    /// Apply a sparse patch to one of the caller's stores.
    ///
    /// # Errors
    ///
    /// `Validation` if a present field is blank, `StoreNotFound` if the
    /// filter matches nothing.
    pub async fn update_store(
        &self,
        owner: MerchantId,
        store_id: StoreId,
        patch: StorePatch,
    ) -> Result<()> {
        let changes = StoreChanges {
            name: patch.name.as_deref().map(Name::parse).transpose()?,
            description: patch
                .description
                .as_deref()
                .map(Description::parse)
                .transpose()?,
        };

        let filter = StoreFilter::new(owner, store_id);
        let matched = self.call(self.catalog.update_store(filter, &changes)).await?;
        if matched == 0 {
            tracing::debug!(merchant_id = %owner, store_id = %store_id, "Store update matched nothing");
            return Err(ServiceError::StoreNotFound);
        }

        if !changes.is_empty() {
            tracing::info!(merchant_id = %owner, store_id = %store_id, "Store updated");
        }
        Ok(())
    }

    /// Delete one of the caller's stores and all of its items.
    ///
    /// # Errors
    ///
    /// `StoreNotFound` if the filter matches nothing.
    pub async fn delete_store(&self, owner: MerchantId, store_id: StoreId) -> Result<()> {
        let filter = StoreFilter::new(owner, store_id);
        let deleted = self.call(self.catalog.delete_store(filter)).await?;
        if deleted == 0 {
            tracing::debug!(merchant_id = %owner, store_id = %store_id, "Store delete matched nothing");
            return Err(ServiceError::StoreNotFound);
        }

        tracing::info!(merchant_id = %owner, store_id = %store_id, "Store deleted");
        Ok(())
    }

    /// Load one of the caller's stores with its items.
    ///
    /// # Errors
    ///
    /// `StoreNotFound` if the filter matches nothing.
    pub async fn view_store(&self, owner: MerchantId, store_id: StoreId) -> Result<StoreView> {
        let filter = StoreFilter::new(owner, store_id);
        let store = self.owned_store(filter).await?;
        let items = self.call(self.catalog.list_items(filter)).await?;
        Ok(StoreView { store, items })
    }

    /// List the caller's stores, most recent first.
    ///
    /// # Errors
    ///
    /// `Persistence` if the read fails.
    pub async fn list_stores(&self, owner: MerchantId) -> Result<Vec<Store>> {
        self.call(self.catalog.list_stores(owner)).await
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Add an item to one of the caller's stores.
    ///
    /// # Errors
    ///
    /// `StoreNotFound` if the store is not the caller's (nothing is written),
    /// `Validation` for blank text or a negative price.
    pub async fn create_item(
        &self,
        owner: MerchantId,
        store_id: StoreId,
        cmd: CreateItem,
    ) -> Result<ItemId> {
        let filter = StoreFilter::new(owner, store_id);
        self.owned_store(filter).await?;

        let fields = NewItem {
            name: Name::parse(&cmd.name)?,
            description: Description::parse(&cmd.description)?,
            available: cmd.available,
            price: Price::new(cmd.price)?,
        };
        let item = Item::new(store_id, fields);

        // The insert repeats the ownership check; 0 means the store vanished.
        let inserted = self.call(self.catalog.insert_item(owner, &item)).await?;
        if inserted == 0 {
            return Err(ServiceError::StoreNotFound);
        }

        tracing::info!(
            merchant_id = %owner,
            store_id = %store_id,
            item_id = %item.id,
            "Item created"
        );
        Ok(item.id)
    }

    /// Load a single item of one of the caller's stores.
    ///
    /// # Errors
    ///
    /// `StoreNotFound` or `ItemNotFound`.
    pub async fn view_item(
        &self,
        owner: MerchantId,
        store_id: StoreId,
        item_id: ItemId,
    ) -> Result<Item> {
        let filter = StoreFilter::new(owner, store_id);
        self.owned_store(filter).await?;

        self.call(self.catalog.find_item(filter.item(item_id)))
            .await?
            .ok_or(ServiceError::ItemNotFound)
    }

    /// Apply a sparse patch to an item.
    ///
    /// # Errors
    ///
    /// `StoreNotFound` if the store is not the caller's, `ItemNotFound` if the
    /// item is not in that store, `Validation` for blank text or a negative
    /// price.
    pub async fn update_item(
        &self,
        owner: MerchantId,
        store_id: StoreId,
        item_id: ItemId,
        patch: ItemPatch,
    ) -> Result<()> {
        let changes = ItemChanges {
            name: patch.name.as_deref().map(Name::parse).transpose()?,
            description: patch
                .description
                .as_deref()
                .map(Description::parse)
                .transpose()?,
            available: patch.available,
            price: patch.price.map(Price::new).transpose()?,
        };

        let filter = StoreFilter::new(owner, store_id);
        self.owned_store(filter).await?;

        let matched = self
            .call(self.catalog.update_item(filter.item(item_id), &changes))
            .await?;
        if matched == 0 {
            tracing::debug!(
                merchant_id = %owner,
                store_id = %store_id,
                item_id = %item_id,
                "Item update matched nothing"
            );
            return Err(ServiceError::ItemNotFound);
        }

        if !changes.is_empty() {
            tracing::info!(
                merchant_id = %owner,
                store_id = %store_id,
                item_id = %item_id,
                "Item updated"
            );
        }
        Ok(())
    }

    /// Remove an item from one of the caller's stores.
    ///
    /// # Errors
    ///
    /// `StoreNotFound` or `ItemNotFound`.
    pub async fn delete_item(
        &self,
        owner: MerchantId,
        store_id: StoreId,
        item_id: ItemId,
    ) -> Result<()> {
        let filter = StoreFilter::new(owner, store_id);
        self.owned_store(filter).await?;

        let deleted = self.call(self.catalog.delete_item(filter.item(item_id))).await?;
        if deleted == 0 {
            return Err(ServiceError::ItemNotFound);
        }

        tracing::info!(
            merchant_id = %owner,
            store_id = %store_id,
            item_id = %item_id,
            "Item deleted"
        );
        Ok(())
    }

    /// Check that the catalog store is reachable.
    ///
    /// # Errors
    ///
    /// `Persistence` if the health check fails or times out.
    pub async fn health_check(&self) -> Result<()> {
        self.call(self.catalog.health_check()).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::{ItemFilter, MemoryCatalogStore};

    const M1: MerchantId = MerchantId::new(1);
    const M2: MerchantId = MerchantId::new(2);

    fn service() -> InventoryService {
        InventoryService::new(Arc::new(MemoryCatalogStore::new()), Duration::from_secs(5))
    }

    fn diner() -> CreateStore {
        CreateStore {
            name: "Joe's Diner".to_string(),
            description: "Breakfast".to_string(),
        }
    }

    fn coffee() -> CreateItem {
        CreateItem {
            name: "Coffee".to_string(),
            description: "Hot".to_string(),
            available: true,
            price: Decimal::new(25, 1),
        }
    }

    #[tokio::test]
    async fn test_create_then_view() {
        let svc = service();
        let id = svc.create_store(M1, diner()).await.unwrap();

        let view = svc.view_store(M1, id).await.unwrap();
        assert_eq!(view.store.id, id);
        assert_eq!(view.store.merchant_id, M1);
        assert_eq!(view.store.name.as_str(), "Joe's Diner");
        assert_eq!(view.store.description.as_str(), "Breakfast");
        assert!(!view.store.available);
        assert!(view.items.is_empty());
    }

    #[tokio::test]
    async fn test_create_store_rejects_blank_fields() {
        let svc = service();
        let err = svc
            .create_store(
                M1,
                CreateStore {
                    name: "  ".to_string(),
                    description: "Breakfast".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(svc.list_stores(M1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_merchant_cannot_touch_store() {
        let svc = service();
        let id = svc.create_store(M1, diner()).await.unwrap();

        assert!(matches!(
            svc.view_store(M2, id).await,
            Err(ServiceError::StoreNotFound)
        ));
        let patch = StorePatch {
            name: Some("Stolen".to_string()),
            description: None,
        };
        assert!(matches!(
            svc.update_store(M2, id, patch).await,
            Err(ServiceError::StoreNotFound)
        ));
        assert!(matches!(
            svc.delete_store(M2, id).await,
            Err(ServiceError::StoreNotFound)
        ));
        assert!(svc.list_stores(M2).await.unwrap().is_empty());

        let view = svc.view_store(M1, id).await.unwrap();
        assert_eq!(view.store.name.as_str(), "Joe's Diner");
    }

    #[tokio::test]
    async fn test_empty_patch_changes_nothing() {
        let svc = service();
        let id = svc.create_store(M1, diner()).await.unwrap();
        let before = svc.view_store(M1, id).await.unwrap().store;

        svc.update_store(M1, id, StorePatch::default()).await.unwrap();

        let after = svc.view_store(M1, id).await.unwrap().store;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_empty_patch_on_missing_store_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.update_store(M1, StoreId::generate(), StorePatch::default())
                .await,
            Err(ServiceError::StoreNotFound)
        ));
    }

    #[tokio::test]
    async fn test_repeated_patch_is_idempotent() {
        let svc = service();
        let id = svc.create_store(M1, diner()).await.unwrap();
        let patch = StorePatch {
            name: None,
            description: Some("Brunch".to_string()),
        };

        svc.update_store(M1, id, patch.clone()).await.unwrap();
        let once = svc.view_store(M1, id).await.unwrap().store;
        svc.update_store(M1, id, patch).await.unwrap();
        let twice = svc.view_store(M1, id).await.unwrap().store;

        assert_eq!(once.name, twice.name);
        assert_eq!(twice.description.as_str(), "Brunch");
        assert_eq!(twice.name.as_str(), "Joe's Diner");
    }

    #[tokio::test]
    async fn test_patch_with_blank_field_is_rejected() {
        let svc = service();
        let id = svc.create_store(M1, diner()).await.unwrap();
        let patch = StorePatch {
            name: Some(String::new()),
            description: None,
        };
        assert!(matches!(
            svc.update_store(M1, id, patch).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_and_foreign_look_the_same() {
        let svc = service();
        let id = svc.create_store(M1, diner()).await.unwrap();

        let missing = svc.delete_store(M1, StoreId::generate()).await.unwrap_err();
        let foreign = svc.delete_store(M2, id).await.unwrap_err();
        assert_eq!(missing.to_string(), foreign.to_string());
    }

    #[tokio::test]
    async fn test_delete_is_terminal() {
        let svc = service();
        let id = svc.create_store(M1, diner()).await.unwrap();
        svc.delete_store(M1, id).await.unwrap();

        assert!(matches!(
            svc.delete_store(M1, id).await,
            Err(ServiceError::StoreNotFound)
        ));
        assert!(matches!(
            svc.view_store(M1, id).await,
            Err(ServiceError::StoreNotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_stores_only_returns_own() {
        let svc = service();
        svc.create_store(M1, diner()).await.unwrap();
        svc.create_store(M1, diner()).await.unwrap();
        svc.create_store(M2, diner()).await.unwrap();

        let stores = svc.list_stores(M1).await.unwrap();
        assert_eq!(stores.len(), 2);
        assert!(stores.iter().all(|s| s.merchant_id == M1));
    }

    #[tokio::test]
    async fn test_item_in_foreign_store_is_not_created() {
        let svc = service();
        let id = svc.create_store(M1, diner()).await.unwrap();

        assert!(matches!(
            svc.create_item(M2, id, coffee()).await,
            Err(ServiceError::StoreNotFound)
        ));
        assert!(svc.view_store(M1, id).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let svc = service();
        let id = svc.create_store(M1, diner()).await.unwrap();
        let mut cmd = coffee();
        cmd.price = Decimal::new(-1, 0);

        assert!(matches!(
            svc.create_item(M1, id, cmd).await,
            Err(ServiceError::Validation(_))
        ));

        let item = svc.create_item(M1, id, coffee()).await.unwrap();
        let patch = ItemPatch {
            price: Some(Decimal::new(-5, 1)),
            ..ItemPatch::default()
        };
        assert!(matches!(
            svc.update_item(M1, id, item, patch).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_item_patch_price_only() {
        let svc = service();
        let store = svc.create_store(M1, diner()).await.unwrap();
        let item = svc.create_item(M1, store, coffee()).await.unwrap();

        let patch = ItemPatch {
            price: Some(Decimal::new(30, 1)),
            ..ItemPatch::default()
        };
        svc.update_item(M1, store, item, patch).await.unwrap();

        let view = svc.view_store(M1, store).await.unwrap();
        let coffee = view.items.iter().find(|i| i.id == item).unwrap();
        assert_eq!(coffee.price.amount(), Decimal::new(3, 0));
        assert_eq!(coffee.name.as_str(), "Coffee");
        assert_eq!(coffee.description.as_str(), "Hot");
        assert!(coffee.available);
    }

    #[tokio::test]
    async fn test_item_patch_false_and_zero_persist() {
        let svc = service();
        let store = svc.create_store(M1, diner()).await.unwrap();
        let item = svc.create_item(M1, store, coffee()).await.unwrap();

        let patch = ItemPatch {
            available: Some(false),
            price: Some(Decimal::ZERO),
            ..ItemPatch::default()
        };
        svc.update_item(M1, store, item, patch).await.unwrap();

        let loaded = svc.view_item(M1, store, item).await.unwrap();
        assert!(!loaded.available);
        assert_eq!(loaded.price.amount(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_item_operations_require_store_ownership() {
        let svc = service();
        let store = svc.create_store(M1, diner()).await.unwrap();
        let item = svc.create_item(M1, store, coffee()).await.unwrap();

        assert!(matches!(
            svc.update_item(M2, store, item, ItemPatch::default()).await,
            Err(ServiceError::StoreNotFound)
        ));
        assert!(matches!(
            svc.delete_item(M2, store, item).await,
            Err(ServiceError::StoreNotFound)
        ));
        assert!(matches!(
            svc.view_item(M2, store, item).await,
            Err(ServiceError::StoreNotFound)
        ));
        assert!(svc.view_item(M1, store, item).await.is_ok());
    }

    #[tokio::test]
    async fn test_item_not_addressable_through_sibling_store() {
        let svc = service();
        let first = svc.create_store(M1, diner()).await.unwrap();
        let second = svc.create_store(M1, diner()).await.unwrap();
        let item = svc.create_item(M1, first, coffee()).await.unwrap();

        assert!(matches!(
            svc.delete_item(M1, second, item).await,
            Err(ServiceError::ItemNotFound)
        ));
        assert!(svc.view_item(M1, first, item).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_item_twice() {
        let svc = service();
        let store = svc.create_store(M1, diner()).await.unwrap();
        let item = svc.create_item(M1, store, coffee()).await.unwrap();

        svc.delete_item(M1, store, item).await.unwrap();
        assert!(matches!(
            svc.delete_item(M1, store, item).await,
            Err(ServiceError::ItemNotFound)
        ));
    }

    #[tokio::test]
    async fn test_store_delete_cascades_to_items() {
        let svc = service();
        let store = svc.create_store(M1, diner()).await.unwrap();
        let item = svc.create_item(M1, store, coffee()).await.unwrap();

        svc.delete_store(M1, store).await.unwrap();

        assert!(matches!(
            svc.view_item(M1, store, item).await,
            Err(ServiceError::StoreNotFound)
        ));
    }

    #[tokio::test]
    async fn test_worked_example() {
        let svc = service();
        let s1 = svc.create_store(M1, diner()).await.unwrap();
        let i1 = svc.create_item(M1, s1, coffee()).await.unwrap();

        let patch = ItemPatch {
            price: Some(Decimal::new(30, 1)),
            ..ItemPatch::default()
        };
        svc.update_item(M1, s1, i1, patch).await.unwrap();

        assert!(matches!(
            svc.delete_store(M2, s1).await,
            Err(ServiceError::StoreNotFound)
        ));

        let view = svc.view_store(M1, s1).await.unwrap();
        assert_eq!(view.items.len(), 1);
        let item = view.items.first().unwrap();
        assert_eq!(item.id, i1);
        assert_eq!(item.price.amount(), Decimal::new(3, 0));
    }

    /// Catalog store whose calls never complete.
    struct StalledCatalog;

    #[async_trait]
    impl CatalogStore for StalledCatalog {
        async fn insert_store(&self, _: &Store) -> std::result::Result<(), RepositoryError> {
            std::future::pending().await
        }
        async fn find_store(
            &self,
            _: StoreFilter,
        ) -> std::result::Result<Option<Store>, RepositoryError> {
            std::future::pending().await
        }
        async fn list_stores(
            &self,
            _: MerchantId,
        ) -> std::result::Result<Vec<Store>, RepositoryError> {
            std::future::pending().await
        }
        async fn update_store(
            &self,
            _: StoreFilter,
            _: &StoreChanges,
        ) -> std::result::Result<u64, RepositoryError> {
            std::future::pending().await
        }
        async fn delete_store(&self, _: StoreFilter) -> std::result::Result<u64, RepositoryError> {
            std::future::pending().await
        }
        async fn insert_item(
            &self,
            _: MerchantId,
            _: &Item,
        ) -> std::result::Result<u64, RepositoryError> {
            std::future::pending().await
        }
        async fn find_item(
            &self,
            _: ItemFilter,
        ) -> std::result::Result<Option<Item>, RepositoryError> {
            std::future::pending().await
        }
        async fn list_items(
            &self,
            _: StoreFilter,
        ) -> std::result::Result<Vec<Item>, RepositoryError> {
            std::future::pending().await
        }
        async fn update_item(
            &self,
            _: ItemFilter,
            _: &ItemChanges,
        ) -> std::result::Result<u64, RepositoryError> {
            std::future::pending().await
        }
        async fn delete_item(&self, _: ItemFilter) -> std::result::Result<u64, RepositoryError> {
            std::future::pending().await
        }
        async fn health_check(&self) -> std::result::Result<(), RepositoryError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_deadline_surfaces_as_persistence_error() {
        let svc = InventoryService::new(Arc::new(StalledCatalog), Duration::from_millis(20));

        let err = svc.create_store(M1, diner()).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Persistence(RepositoryError::Timeout(_))
        ));
        assert!(svc.health_check().await.is_err());
    }
}
