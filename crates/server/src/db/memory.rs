//! In-process implementation of [`CatalogStore`].
//!
//! Backs the `memory` storage mode and the test suites. Every method holds
//! the lock for its whole body, which gives the same one-call atomicity the
//! `PostgreSQL` statements have.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use storekeep_core::{ItemId, MerchantId, StoreId};

use super::{CatalogStore, ItemFilter, RepositoryError, StoreFilter};
use crate::models::{Item, ItemChanges, Store, StoreChanges};

#[derive(Debug, Default)]
struct Collections {
    stores: HashMap<StoreId, Store>,
    items: HashMap<ItemId, Item>,
}

impl Collections {
    fn store(&self, filter: StoreFilter) -> Option<&Store> {
        self.stores
            .get(&filter.store_id)
            .filter(|s| s.merchant_id == filter.merchant_id)
    }

    fn owns(&self, filter: StoreFilter) -> bool {
        self.store(filter).is_some()
    }

    fn item_mut(&mut self, filter: ItemFilter) -> Option<&mut Item> {
        if !self.owns(filter.store) {
            return None;
        }
        self.items
            .get_mut(&filter.item_id)
            .filter(|i| i.store_id == filter.store.store_id)
    }
}

/// Catalog store kept in memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    inner: RwLock<Collections>,
}

impl MemoryCatalogStore {
    /// Create an empty catalog store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn insert_store(&self, store: &Store) -> Result<(), RepositoryError> {
        let mut guard = self.inner.write().await;
        guard.stores.insert(store.id, store.clone());
        Ok(())
    }

    async fn find_store(&self, filter: StoreFilter) -> Result<Option<Store>, RepositoryError> {
        let guard = self.inner.read().await;
        Ok(guard.store(filter).cloned())
    }

    async fn list_stores(&self, merchant_id: MerchantId) -> Result<Vec<Store>, RepositoryError> {
        let guard = self.inner.read().await;
        let mut stores: Vec<Store> = guard
            .stores
            .values()
            .filter(|s| s.merchant_id == merchant_id)
            .cloned()
            .collect();
        stores.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(stores)
    }

    async fn update_store(
        &self,
        filter: StoreFilter,
        changes: &StoreChanges,
    ) -> Result<u64, RepositoryError> {
        let mut guard = self.inner.write().await;
        let Some(store) = guard
            .stores
            .get_mut(&filter.store_id)
            .filter(|s| s.merchant_id == filter.merchant_id)
        else {
            return Ok(0);
        };
        store.apply(changes);
        Ok(1)
    }

    async fn delete_store(&self, filter: StoreFilter) -> Result<u64, RepositoryError> {
        let mut guard = self.inner.write().await;
        if !guard.owns(filter) {
            return Ok(0);
        }
        guard.stores.remove(&filter.store_id);
        guard.items.retain(|_, item| item.store_id != filter.store_id);
        Ok(1)
    }

    async fn insert_item(
        &self,
        merchant_id: MerchantId,
        item: &Item,
    ) -> Result<u64, RepositoryError> {
        let mut guard = self.inner.write().await;
        if !guard.owns(StoreFilter::new(merchant_id, item.store_id)) {
            return Ok(0);
        }
        guard.items.insert(item.id, item.clone());
        Ok(1)
    }

    async fn find_item(&self, filter: ItemFilter) -> Result<Option<Item>, RepositoryError> {
        let guard = self.inner.read().await;
        if !guard.owns(filter.store) {
            return Ok(None);
        }
        Ok(guard
            .items
            .get(&filter.item_id)
            .filter(|i| i.store_id == filter.store.store_id)
            .cloned())
    }

    async fn list_items(&self, filter: StoreFilter) -> Result<Vec<Item>, RepositoryError> {
        let guard = self.inner.read().await;
        if !guard.owns(filter) {
            return Ok(Vec::new());
        }
        let mut items: Vec<Item> = guard
            .items
            .values()
            .filter(|i| i.store_id == filter.store_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn update_item(
        &self,
        filter: ItemFilter,
        changes: &ItemChanges,
    ) -> Result<u64, RepositoryError> {
        let mut guard = self.inner.write().await;
        let Some(item) = guard.item_mut(filter) else {
            return Ok(0);
        };
        item.apply(changes);
        Ok(1)
    }

    async fn delete_item(&self, filter: ItemFilter) -> Result<u64, RepositoryError> {
        let mut guard = self.inner.write().await;
        if guard.item_mut(filter).is_none() {
            return Ok(0);
        }
        guard.items.remove(&filter.item_id);
        Ok(1)
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use storekeep_core::{Description, Name, Price};

    use super::*;
    use crate::models::{NewItem, NewStore};

    fn store_for(merchant: i64) -> Store {
        Store::new(
            MerchantId::new(merchant),
            NewStore {
                name: Name::parse("Corner Shop").unwrap(),
                description: Description::parse("Everything").unwrap(),
            },
        )
    }

    fn item_in(store_id: StoreId) -> Item {
        Item::new(
            store_id,
            NewItem {
                name: Name::parse("Tea").unwrap(),
                description: Description::parse("Green").unwrap(),
                available: true,
                price: Price::new(Decimal::new(150, 2)).unwrap(),
            },
        )
    }

    #[tokio::test]
    async fn test_foreign_owner_matches_nothing() {
        let catalog = MemoryCatalogStore::new();
        let store = store_for(1);
        catalog.insert_store(&store).await.unwrap();

        let foreign = StoreFilter::new(MerchantId::new(2), store.id);
        assert!(catalog.find_store(foreign).await.unwrap().is_none());
        assert_eq!(catalog.delete_store(foreign).await.unwrap(), 0);
        assert_eq!(
            catalog
                .update_store(foreign, &StoreChanges::default())
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_insert_item_requires_ownership() {
        let catalog = MemoryCatalogStore::new();
        let store = store_for(1);
        catalog.insert_store(&store).await.unwrap();

        let item = item_in(store.id);
        assert_eq!(catalog.insert_item(MerchantId::new(2), &item).await.unwrap(), 0);
        assert_eq!(catalog.insert_item(MerchantId::new(1), &item).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_item_not_reachable_through_other_store() {
        let catalog = MemoryCatalogStore::new();
        let first = store_for(1);
        let second = store_for(1);
        catalog.insert_store(&first).await.unwrap();
        catalog.insert_store(&second).await.unwrap();

        let item = item_in(first.id);
        catalog.insert_item(MerchantId::new(1), &item).await.unwrap();

        let wrong_store = StoreFilter::new(MerchantId::new(1), second.id).item(item.id);
        assert!(catalog.find_item(wrong_store).await.unwrap().is_none());
        assert_eq!(catalog.delete_item(wrong_store).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_store_cascades() {
        let catalog = MemoryCatalogStore::new();
        let store = store_for(1);
        catalog.insert_store(&store).await.unwrap();
        let item = item_in(store.id);
        catalog.insert_item(MerchantId::new(1), &item).await.unwrap();

        let filter = StoreFilter::new(MerchantId::new(1), store.id);
        assert_eq!(catalog.delete_store(filter).await.unwrap(), 1);
        assert!(catalog.inner.read().await.items.is_empty());
    }
}
