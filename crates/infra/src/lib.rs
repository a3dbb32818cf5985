//! Infrastructure layer: catalog storage adapters and the reconciliation job.

pub mod catalog_store;
pub mod reconcile;

pub use catalog_store::{CatalogStore, CatalogStoreError, InMemoryCatalogStore, PostgresCatalogStore};
pub use reconcile::{
    ReconcileOptions, ReconciliationError, ReconciliationReport, StorageCountReconciler,
};
