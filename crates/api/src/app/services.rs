//! Infrastructure wiring: which catalog store backs the app, and how the
//! reconciler is configured.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use stockroom_infra::{
    CatalogStore, InMemoryCatalogStore, PostgresCatalogStore, ReconcileOptions,
    StorageCountReconciler,
};

use crate::config::{AppConfig, StoreConfig};

/// Catalog store shared by every handler.
pub type SharedCatalog = Arc<dyn CatalogStore>;

/// Services shared by the HTTP handlers (injected via `Extension`).
#[derive(Clone)]
pub struct AppServices {
    catalog: SharedCatalog,
    reconcile_options: ReconcileOptions,
}

impl AppServices {
    pub fn new(catalog: SharedCatalog, reconcile_options: ReconcileOptions) -> Self {
        Self {
            catalog,
            reconcile_options,
        }
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    /// A reconciler over the shared store; cheap, built per request.
    pub fn reconciler(&self) -> StorageCountReconciler<SharedCatalog> {
        StorageCountReconciler::with_options(self.catalog.clone(), self.reconcile_options)
    }
}

/// Connect the configured catalog store.
///
/// For Postgres this opens the pool and makes sure the catalog tables exist.
pub async fn connect_store(store: &StoreConfig) -> anyhow::Result<SharedCatalog> {
    match store {
        StoreConfig::InMemory => {
            tracing::warn!("using in-memory catalog store; data is lost on exit");
            Ok(Arc::new(InMemoryCatalogStore::new()))
        }
        StoreConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(database_url)
                .await
                .context("failed to connect to Postgres")?;

            let store = PostgresCatalogStore::new(pool);
            store
                .ensure_schema()
                .await
                .context("failed to prepare catalog schema")?;

            tracing::info!(max_connections, "connected to Postgres catalog store");
            Ok(Arc::new(store))
        }
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let catalog = connect_store(&config.store).await?;
    let options = ReconcileOptions::default().with_page_size(config.reconcile_page_size);
    Ok(AppServices::new(catalog, options))
}
