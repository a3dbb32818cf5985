//! Data-access boundary for the storage and product catalogs.
//!
//! The reconciliation routine never touches a connection directly; it is
//! handed a `CatalogStore` and only talks to that. Implementations:
//!
//! - [`InMemoryCatalogStore`]: tests/dev, with fault injection
//! - [`PostgresCatalogStore`]: production, backed by `sqlx`

pub mod in_memory;
pub mod postgres;

pub use in_memory::{FaultPlan, InMemoryCatalogStore};
pub use postgres::PostgresCatalogStore;

use std::sync::Arc;

use stockroom_catalog::{ProductRecord, StorageRecord};
use stockroom_core::StorageId;
use thiserror::Error;

/// Data-access failure (connection, query, update, decoding).
///
/// Every variant is fatal to a reconciliation run; nothing here is retried.
#[derive(Debug, Error)]
pub enum CatalogStoreError {
    /// The store could not be reached (pool closed, network, timeout).
    #[error("connection failed: {0}")]
    Connection(String),

    /// A query or update was rejected or failed mid-flight.
    #[error("query failed: {0}")]
    Query(String),

    /// The addressed record does not exist.
    #[error("storage {0} not found")]
    NotFound(StorageId),

    /// A stored row could not be mapped back into a domain record.
    #[error("failed to decode record: {0}")]
    Decode(String),
}

/// Storage + product catalog operations needed by reconciliation and its
/// HTTP/batch surfaces.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Keyset page of storages ordered by id, starting strictly after `after`.
    async fn list_storages(
        &self,
        after: Option<StorageId>,
        limit: usize,
    ) -> Result<Vec<StorageRecord>, CatalogStoreError>;

    async fn get_storage(&self, id: StorageId) -> Result<Option<StorageRecord>, CatalogStoreError>;

    /// Number of distinct products whose locations reference `id`.
    async fn count_products_in_storage(&self, id: StorageId) -> Result<u64, CatalogStoreError>;

    /// Overwrite the cached `products_count` of one storage.
    async fn set_products_count(&self, id: StorageId, count: u64) -> Result<(), CatalogStoreError>;

    async fn insert_storage(&self, storage: StorageRecord) -> Result<(), CatalogStoreError>;

    async fn insert_product(&self, product: ProductRecord) -> Result<(), CatalogStoreError>;

    /// Cheap connectivity probe.
    async fn ping(&self) -> Result<(), CatalogStoreError>;
}

#[async_trait::async_trait]
impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    async fn list_storages(
        &self,
        after: Option<StorageId>,
        limit: usize,
    ) -> Result<Vec<StorageRecord>, CatalogStoreError> {
        (**self).list_storages(after, limit).await
    }

    async fn get_storage(&self, id: StorageId) -> Result<Option<StorageRecord>, CatalogStoreError> {
        (**self).get_storage(id).await
    }

    async fn count_products_in_storage(&self, id: StorageId) -> Result<u64, CatalogStoreError> {
        (**self).count_products_in_storage(id).await
    }

    async fn set_products_count(&self, id: StorageId, count: u64) -> Result<(), CatalogStoreError> {
        (**self).set_products_count(id, count).await
    }

    async fn insert_storage(&self, storage: StorageRecord) -> Result<(), CatalogStoreError> {
        (**self).insert_storage(storage).await
    }

    async fn insert_product(&self, product: ProductRecord) -> Result<(), CatalogStoreError> {
        (**self).insert_product(product).await
    }

    async fn ping(&self) -> Result<(), CatalogStoreError> {
        (**self).ping().await
    }
}
