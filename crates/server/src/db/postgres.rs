//! `PostgreSQL` implementation of [`CatalogStore`].
//!
//! Queries are built at runtime with `sqlx::query`/`query_as` so the crate
//! compiles without a live database. Ownership is enforced inside each
//! statement (joins against `inventory.store` on `merchant_id`), never by a
//! separate read followed by a write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use storekeep_core::{Description, ItemId, MerchantId, Name, Price, StoreId};

use super::{CatalogStore, ItemFilter, RepositoryError, StoreFilter};
use crate::models::{Item, ItemChanges, Store, StoreChanges};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `inventory.store` queries.
#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: Uuid,
    merchant_id: i64,
    name: String,
    description: String,
    available: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: StoreId::new(row.id),
            merchant_id: MerchantId::new(row.merchant_id),
            name: parse_text(Name::parse(&row.name), "store name")?,
            description: parse_text(Description::parse(&row.description), "store description")?,
            available: row.available,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for `inventory.item` queries.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    store_id: Uuid,
    name: String,
    description: String,
    available: bool,
    price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = RepositoryError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid item price: {e}")))?;

        Ok(Self {
            id: ItemId::new(row.id),
            store_id: StoreId::new(row.store_id),
            name: parse_text(Name::parse(&row.name), "item name")?,
            description: parse_text(Description::parse(&row.description), "item description")?,
            available: row.available,
            price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_text<T>(
    parsed: Result<T, storekeep_core::TextError>,
    what: &str,
) -> Result<T, RepositoryError> {
    parsed.map_err(|e| RepositoryError::DataCorruption(format!("invalid {what} in database: {e}")))
}

const STORE_COLUMNS: &str = "id, merchant_id, name, description, available, created_at, updated_at";

const ITEM_COLUMNS: &str = "i.id, i.store_id, i.name, i.description, i.available, i.price, \
                            i.created_at, i.updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Catalog store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Create a new catalog store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count_store(&self, filter: StoreFilter) -> Result<u64, RepositoryError> {
        Ok(u64::from(self.find_store(filter).await?.is_some()))
    }

    async fn count_item(&self, filter: ItemFilter) -> Result<u64, RepositoryError> {
        Ok(u64::from(self.find_item(filter).await?.is_some()))
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn insert_store(&self, store: &Store) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO inventory.store
                (id, merchant_id, name, description, available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(store.id)
        .bind(store.merchant_id)
        .bind(store.name.as_str())
        .bind(store.description.as_str())
        .bind(store.available)
        .bind(store.created_at)
        .bind(store.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_store(&self, filter: StoreFilter) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM inventory.store WHERE id = $1 AND merchant_id = $2"
        ))
        .bind(filter.store_id)
        .bind(filter.merchant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Store::try_from).transpose()
    }

    async fn list_stores(&self, merchant_id: MerchantId) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM inventory.store \
             WHERE merchant_id = $1 \
             ORDER BY created_at DESC, id"
        ))
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_store(
        &self,
        filter: StoreFilter,
        changes: &StoreChanges,
    ) -> Result<u64, RepositoryError> {
        if changes.is_empty() {
            return self.count_store(filter).await;
        }

        let result = sqlx::query(
            r"
            UPDATE inventory.store
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                updated_at = now()
            WHERE id = $1 AND merchant_id = $2
            ",
        )
        .bind(filter.store_id)
        .bind(filter.merchant_id)
        .bind(changes.name.as_ref().map(Name::as_str))
        .bind(changes.description.as_ref().map(Description::as_str))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_store(&self, filter: StoreFilter) -> Result<u64, RepositoryError> {
        // Items go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM inventory.store WHERE id = $1 AND merchant_id = $2")
            .bind(filter.store_id)
            .bind(filter.merchant_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_item(
        &self,
        merchant_id: MerchantId,
        item: &Item,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO inventory.item
                (id, store_id, name, description, available, price, created_at, updated_at)
            SELECT $1, s.id, $3, $4, $5, $6, $7, $8
            FROM inventory.store AS s
            WHERE s.id = $2 AND s.merchant_id = $9
            ",
        )
        .bind(item.id)
        .bind(item.store_id)
        .bind(item.name.as_str())
        .bind(item.description.as_str())
        .bind(item.available)
        .bind(item.price.amount())
        .bind(item.created_at)
        .bind(item.updated_at)
        .bind(merchant_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_item(&self, filter: ItemFilter) -> Result<Option<Item>, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory.item AS i \
             JOIN inventory.store AS s ON s.id = i.store_id \
             WHERE i.id = $1 AND i.store_id = $2 AND s.merchant_id = $3"
        ))
        .bind(filter.item_id)
        .bind(filter.store.store_id)
        .bind(filter.store.merchant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Item::try_from).transpose()
    }

    async fn list_items(&self, filter: StoreFilter) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory.item AS i \
             JOIN inventory.store AS s ON s.id = i.store_id \
             WHERE i.store_id = $1 AND s.merchant_id = $2 \
             ORDER BY i.created_at, i.id"
        ))
        .bind(filter.store_id)
        .bind(filter.merchant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_item(
        &self,
        filter: ItemFilter,
        changes: &ItemChanges,
    ) -> Result<u64, RepositoryError> {
        if changes.is_empty() {
            return self.count_item(filter).await;
        }

        let result = sqlx::query(
            r"
            UPDATE inventory.item AS i
            SET name = COALESCE($4, i.name),
                description = COALESCE($5, i.description),
                available = COALESCE($6, i.available),
                price = COALESCE($7, i.price),
                updated_at = now()
            FROM inventory.store AS s
            WHERE i.id = $1
              AND i.store_id = $2
              AND s.id = i.store_id
              AND s.merchant_id = $3
            ",
        )
        .bind(filter.item_id)
        .bind(filter.store.store_id)
        .bind(filter.store.merchant_id)
        .bind(changes.name.as_ref().map(Name::as_str))
        .bind(changes.description.as_ref().map(Description::as_str))
        .bind(changes.available)
        .bind(changes.price.map(|p| p.amount()))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_item(&self, filter: ItemFilter) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM inventory.item AS i
            USING inventory.store AS s
            WHERE i.id = $1
              AND i.store_id = $2
              AND s.id = i.store_id
              AND s.merchant_id = $3
            ",
        )
        .bind(filter.item_id)
        .bind(filter.store.store_id)
        .bind(filter.store.merchant_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

// Run with a database: DATABASE_URL=postgres://... cargo test -p storekeep-server -- --ignored
#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
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

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
    async fn test_foreign_owner_matches_nothing(pool: PgPool) {
        let catalog = PgCatalogStore::new(pool);
        let store = store_for(1);
        catalog.insert_store(&store).await.unwrap();

        let foreign = StoreFilter::new(MerchantId::new(2), store.id);
        let rename = StoreChanges {
            name: Some(Name::parse("Taken").unwrap()),
            ..StoreChanges::default()
        };
        assert!(catalog.find_store(foreign).await.unwrap().is_none());
        assert_eq!(catalog.update_store(foreign, &rename).await.unwrap(), 0);
        assert_eq!(catalog.delete_store(foreign).await.unwrap(), 0);

        let own = StoreFilter::new(MerchantId::new(1), store.id);
        let found = catalog.find_store(own).await.unwrap().unwrap();
        assert_eq!(found.name.as_str(), "Corner Shop");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
    async fn test_update_counts_matched_rows(pool: PgPool) {
        let catalog = PgCatalogStore::new(pool);
        let store = store_for(1);
        catalog.insert_store(&store).await.unwrap();
        let own = StoreFilter::new(MerchantId::new(1), store.id);

        let rename = StoreChanges {
            name: Some(Name::parse("Renamed").unwrap()),
            ..StoreChanges::default()
        };
        assert_eq!(catalog.update_store(own, &rename).await.unwrap(), 1);
        assert_eq!(catalog.update_store(own, &rename).await.unwrap(), 1);
        assert_eq!(
            catalog
                .update_store(own, &StoreChanges::default())
                .await
                .unwrap(),
            1
        );

        let found = catalog.find_store(own).await.unwrap().unwrap();
        assert_eq!(found.name.as_str(), "Renamed");
        assert_eq!(found.description.as_str(), "Everything");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
    async fn test_insert_item_requires_ownership(pool: PgPool) {
        let catalog = PgCatalogStore::new(pool);
        let store = store_for(1);
        catalog.insert_store(&store).await.unwrap();

        let item = item_in(store.id);
        assert_eq!(catalog.insert_item(MerchantId::new(2), &item).await.unwrap(), 0);
        assert_eq!(catalog.insert_item(MerchantId::new(1), &item).await.unwrap(), 1);

        let listed = catalog
            .list_items(StoreFilter::new(MerchantId::new(1), store.id))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed.first().unwrap().price.amount(), Decimal::new(150, 2));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
    async fn test_item_writes_filtered_by_store_and_owner(pool: PgPool) {
        let catalog = PgCatalogStore::new(pool);
        let first = store_for(1);
        let second = store_for(1);
        catalog.insert_store(&first).await.unwrap();
        catalog.insert_store(&second).await.unwrap();

        let item = item_in(first.id);
        catalog.insert_item(MerchantId::new(1), &item).await.unwrap();

        let changes = ItemChanges {
            available: Some(false),
            price: Some(Price::new(Decimal::ZERO).unwrap()),
            ..ItemChanges::default()
        };

        let wrong_store = StoreFilter::new(MerchantId::new(1), second.id).item(item.id);
        let wrong_owner = StoreFilter::new(MerchantId::new(2), first.id).item(item.id);
        for filter in [wrong_store, wrong_owner] {
            assert!(catalog.find_item(filter).await.unwrap().is_none());
            assert_eq!(catalog.update_item(filter, &changes).await.unwrap(), 0);
            assert_eq!(catalog.delete_item(filter).await.unwrap(), 0);
        }

        let own = StoreFilter::new(MerchantId::new(1), first.id).item(item.id);
        assert_eq!(catalog.update_item(own, &changes).await.unwrap(), 1);
        let updated = catalog.find_item(own).await.unwrap().unwrap();
        assert!(!updated.available);
        assert_eq!(updated.price.amount(), Decimal::ZERO);
        assert_eq!(updated.name.as_str(), "Tea");

        assert_eq!(catalog.delete_item(own).await.unwrap(), 1);
        assert!(catalog.find_item(own).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
    async fn test_delete_store_cascades(pool: PgPool) {
        let catalog = PgCatalogStore::new(pool.clone());
        let store = store_for(1);
        catalog.insert_store(&store).await.unwrap();
        let item = item_in(store.id);
        catalog.insert_item(MerchantId::new(1), &item).await.unwrap();

        let filter = StoreFilter::new(MerchantId::new(1), store.id);
        assert_eq!(catalog.delete_store(filter).await.unwrap(), 1);

        let remaining: i64 = sqlx::query_scalar("SELECT count(*) FROM inventory.item")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
