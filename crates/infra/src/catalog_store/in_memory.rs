use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use stockroom_catalog::{count_products_in, ProductRecord, StorageRecord};
use stockroom_core::{ProductId, StorageId};

use super::{CatalogStore, CatalogStoreError};

/// Scripted failures for exercising abort paths.
///
/// Call numbers are 1-based and count calls made since the plan was installed.
/// Each scripted failure fires on exactly that call.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    fail_count_on: Option<usize>,
    fail_update_on: Option<usize>,
    fail_listing_on: Option<usize>,
}

impl FaultPlan {
    pub fn fail_count_query_on(mut self, call: usize) -> Self {
        self.fail_count_on = Some(call);
        self
    }

    pub fn fail_update_on(mut self, call: usize) -> Self {
        self.fail_update_on = Some(call);
        self
    }

    pub fn fail_listing_on(mut self, call: usize) -> Self {
        self.fail_listing_on = Some(call);
        self
    }
}

/// In-memory catalog store.
///
/// Intended for tests/dev. Storages are kept ordered by id so keyset paging
/// behaves like the Postgres adapter.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    storages: RwLock<BTreeMap<StorageId, StorageRecord>>,
    products: RwLock<BTreeMap<ProductId, ProductRecord>>,
    faults: Mutex<FaultPlan>,
    listing_calls: AtomicUsize,
    count_calls: AtomicUsize,
    update_calls: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a fault plan and reset the call counters it is measured against.
    pub fn set_faults(&self, plan: FaultPlan) {
        if let Ok(mut faults) = self.faults.lock() {
            *faults = plan;
        }
        self.listing_calls.store(0, Ordering::SeqCst);
        self.count_calls.store(0, Ordering::SeqCst);
        self.update_calls.store(0, Ordering::SeqCst);
    }

    /// Number of successful `set_products_count` writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Replace a product's locations (simulates a stock edit elsewhere in the app).
    pub fn replace_product(&self, product: ProductRecord) -> Result<(), CatalogStoreError> {
        let mut products = self.products.write().map_err(|_| poisoned())?;
        products.insert(product.id(), product);
        Ok(())
    }

    pub fn remove_product(&self, id: ProductId) -> Result<(), CatalogStoreError> {
        let mut products = self.products.write().map_err(|_| poisoned())?;
        products.remove(&id);
        Ok(())
    }

    fn faults(&self) -> Result<FaultPlan, CatalogStoreError> {
        self.faults.lock().map(|f| f.clone()).map_err(|_| poisoned())
    }
}

fn poisoned() -> CatalogStoreError {
    CatalogStoreError::Query("lock poisoned".to_string())
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn list_storages(
        &self,
        after: Option<StorageId>,
        limit: usize,
    ) -> Result<Vec<StorageRecord>, CatalogStoreError> {
        let call = self.listing_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.faults()?.fail_listing_on == Some(call) {
            return Err(CatalogStoreError::Connection(format!(
                "storage listing unavailable (listing call {call})"
            )));
        }

        let storages = self.storages.read().map_err(|_| poisoned())?;
        let page = match after {
            Some(cursor) => storages
                .range((std::ops::Bound::Excluded(cursor), std::ops::Bound::Unbounded))
                .map(|(_, s)| s.clone())
                .take(limit)
                .collect(),
            None => storages.values().take(limit).cloned().collect(),
        };
        Ok(page)
    }

    async fn get_storage(&self, id: StorageId) -> Result<Option<StorageRecord>, CatalogStoreError> {
        let storages = self.storages.read().map_err(|_| poisoned())?;
        Ok(storages.get(&id).cloned())
    }

    async fn count_products_in_storage(&self, id: StorageId) -> Result<u64, CatalogStoreError> {
        let call = self.count_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.faults()?.fail_count_on == Some(call) {
            return Err(CatalogStoreError::Connection(format!(
                "product catalog unreachable (count call {call})"
            )));
        }

        let products = self.products.read().map_err(|_| poisoned())?;
        Ok(count_products_in(products.values(), id))
    }

    async fn set_products_count(&self, id: StorageId, count: u64) -> Result<(), CatalogStoreError> {
        let call = self.update_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.faults()?.fail_update_on == Some(call) {
            return Err(CatalogStoreError::Query(format!(
                "update rejected (update call {call})"
            )));
        }

        let mut storages = self.storages.write().map_err(|_| poisoned())?;
        let storage = storages.get_mut(&id).ok_or(CatalogStoreError::NotFound(id))?;
        storage.set_products_count(count);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn insert_storage(&self, storage: StorageRecord) -> Result<(), CatalogStoreError> {
        let mut storages = self.storages.write().map_err(|_| poisoned())?;
        storages.insert(storage.id(), storage);
        Ok(())
    }

    async fn insert_product(&self, product: ProductRecord) -> Result<(), CatalogStoreError> {
        self.replace_product(product)
    }

    async fn ping(&self) -> Result<(), CatalogStoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_catalog::LocationAssignment;

    fn storage(name: &str, count: u64) -> StorageRecord {
        StorageRecord::new(StorageId::new(), name, count).unwrap()
    }

    #[tokio::test]
    async fn pages_walk_every_storage_once_in_id_order() {
        let store = InMemoryCatalogStore::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let s = storage(&format!("Shelf {i}"), 0);
            ids.push(s.id());
            store.insert_storage(s).await.unwrap();
        }
        ids.sort();

        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let page = store.list_storages(cursor, 2).await.unwrap();
            if page.is_empty() {
                break;
            }
            cursor = page.last().map(|s| s.id());
            seen.extend(page.into_iter().map(|s| s.id()));
        }

        assert_eq!(seen, ids);
    }

    #[tokio::test]
    async fn count_reflects_product_locations() {
        let store = InMemoryCatalogStore::new();
        let s = storage("Back room", 0);
        let id = s.id();
        store.insert_storage(s).await.unwrap();

        for _ in 0..3 {
            let p = ProductRecord::new(ProductId::new(), "Conditioner", vec![LocationAssignment::new(id, 2)])
                .unwrap();
            store.insert_product(p).await.unwrap();
        }

        assert_eq!(store.count_products_in_storage(id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn updating_missing_storage_is_not_found() {
        let store = InMemoryCatalogStore::new();
        let id = StorageId::new();
        let err = store.set_products_count(id, 1).await.unwrap_err();
        assert!(matches!(err, CatalogStoreError::NotFound(missing) if missing == id));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn scripted_count_failure_fires_once() {
        let store = InMemoryCatalogStore::new();
        store.set_faults(FaultPlan::default().fail_count_query_on(2));
        let id = StorageId::new();

        assert!(store.count_products_in_storage(id).await.is_ok());
        assert!(matches!(
            store.count_products_in_storage(id).await,
            Err(CatalogStoreError::Connection(_))
        ));
        assert!(store.count_products_in_storage(id).await.is_ok());
    }

    #[tokio::test]
    async fn scripted_listing_failure_hits_only_that_call() {
        let store = InMemoryCatalogStore::new();
        store.insert_storage(storage("Annex", 0)).await.unwrap();
        store.set_faults(FaultPlan::default().fail_listing_on(2));

        assert_eq!(store.list_storages(None, 10).await.unwrap().len(), 1);
        assert!(matches!(
            store.list_storages(None, 10).await,
            Err(CatalogStoreError::Connection(_))
        ));
        assert_eq!(store.list_storages(None, 10).await.unwrap().len(), 1);
    }
}
