//! Storage product-count reconciliation.
//!
//! Walks the storage catalog, recounts the products referencing each storage,
//! and overwrites the cached `products_count` wherever it has drifted.
//!
//! Storages are processed one at a time, each one fully (count, compare,
//! maybe write) before the next. Every write is committed on its own: there
//! is no transaction around the run, so when a run aborts the corrections
//! made before the failure stay in place.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument, warn};

use stockroom_catalog::{CountCorrection, StorageCountDiagnosis, StorageRecord};
use stockroom_core::StorageId;

use crate::catalog_store::{CatalogStore, CatalogStoreError};

/// Default number of storages loaded per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Tuning for a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    page_size: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ReconcileOptions {
    /// Page size is clamped to at least one storage per page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub storages_examined: usize,
    /// Only storages whose cached count changed, in processing order.
    pub corrections: Vec<CountCorrection>,
}

/// A run aborted on a data-access failure.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("failed to load storages")]
    Listing {
        #[source]
        source: CatalogStoreError,
    },

    #[error("failed to reconcile storage {storage_id}")]
    Storage {
        storage_id: StorageId,
        #[source]
        source: CatalogStoreError,
    },
}

impl ReconciliationError {
    /// The underlying data-access failure.
    pub fn data_access(&self) -> &CatalogStoreError {
        match self {
            Self::Listing { source } | Self::Storage { source, .. } => source,
        }
    }

    /// The storage being processed when the run aborted, if any.
    pub fn storage_id(&self) -> Option<StorageId> {
        match self {
            Self::Listing { .. } => None,
            Self::Storage { storage_id, .. } => Some(*storage_id),
        }
    }
}

/// Recomputes cached per-storage product counts against a catalog store.
#[derive(Debug, Clone)]
pub struct StorageCountReconciler<S> {
    store: S,
    options: ReconcileOptions,
}

impl<S> StorageCountReconciler<S>
where
    S: CatalogStore,
{
    pub fn new(store: S) -> Self {
        Self::with_options(store, ReconcileOptions::default())
    }

    pub fn with_options(store: S, options: ReconcileOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one full pass over the storage catalog.
    ///
    /// Aborts on the first data-access failure; earlier corrections remain
    /// committed.
    #[instrument(skip(self), fields(page_size = self.options.page_size))]
    pub async fn run(&self) -> Result<ReconciliationReport, ReconciliationError> {
        let started_at = Utc::now();
        let page_size = self.options.page_size;

        let mut corrections = Vec::new();
        let mut storages_examined = 0usize;
        let mut cursor: Option<StorageId> = None;

        info!("starting storage product-count reconciliation");

        loop {
            let page = match self.store.list_storages(cursor, page_size).await {
                Ok(page) => page,
                Err(source) => {
                    warn!(
                        storages_examined,
                        corrections_committed = corrections.len(),
                        "reconciliation aborted while loading storages: {source}"
                    );
                    return Err(ReconciliationError::Listing { source });
                }
            };

            let Some(last) = page.last() else { break };
            cursor = Some(last.id());
            let is_last_page = page.len() < page_size;

            for storage in &page {
                match self.reconcile_storage(storage).await {
                    Ok(correction) => {
                        storages_examined += 1;
                        corrections.extend(correction);
                    }
                    Err(source) => {
                        warn!(
                            storage_id = %storage.id(),
                            storages_examined,
                            corrections_committed = corrections.len(),
                            "reconciliation aborted: {source}"
                        );
                        return Err(ReconciliationError::Storage {
                            storage_id: storage.id(),
                            source,
                        });
                    }
                }
            }

            if is_last_page {
                break;
            }
        }

        info!(
            storages_examined,
            corrections = corrections.len(),
            "storage product-count reconciliation finished"
        );

        Ok(ReconciliationReport {
            started_at,
            finished_at: Utc::now(),
            storages_examined,
            corrections,
        })
    }

    /// Count, compare and, when the cached count is off, write one storage.
    async fn reconcile_storage(
        &self,
        storage: &StorageRecord,
    ) -> Result<Option<CountCorrection>, CatalogStoreError> {
        let actual = self.store.count_products_in_storage(storage.id()).await?;

        info!(
            storage_id = %storage.id(),
            name = storage.name(),
            cached = storage.products_count(),
            actual,
            "storage examined"
        );

        let Some(correction) = CountCorrection::between(storage, actual) else {
            return Ok(None);
        };

        self.store.set_products_count(storage.id(), actual).await?;

        info!(
            storage_id = %correction.storage_id,
            old_count = correction.old_count,
            new_count = correction.new_count,
            "corrected cached product count"
        );

        Ok(Some(correction))
    }

    /// Cached vs. actual count for one storage, without writing anything.
    ///
    /// `None` when the storage does not exist.
    #[instrument(skip(self))]
    pub async fn diagnose(
        &self,
        storage_id: StorageId,
    ) -> Result<Option<StorageCountDiagnosis>, CatalogStoreError> {
        let Some(storage) = self.store.get_storage(storage_id).await? else {
            return Ok(None);
        };

        let actual = self.store.count_products_in_storage(storage_id).await?;
        Ok(Some(StorageCountDiagnosis::new(&storage, actual)))
    }
}
