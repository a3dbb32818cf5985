//! Postgres-backed catalog store.
//!
//! Storages live in `storages` (one row per location, cached count in
//! `products_count`). Products live in `products` with their location
//! assignments as a JSONB array of `{"storageId", "stock", "visible"}`
//! objects, the same shape the API serializes.
//!
//! ## Error Mapping
//!
//! | SQLx Error | CatalogStoreError |
//! |------------|-------------------|
//! | PoolClosed / PoolTimedOut / Io / Tls | `Connection` |
//! | Database (any code) | `Query` |
//! | ColumnDecode / Decode / TypeNotFound | `Decode` |
//! | Other | `Query` |

use std::sync::Arc;

use sqlx::{PgPool, Row};
use tracing::instrument;

use stockroom_catalog::{ProductRecord, StorageRecord};
use stockroom_core::StorageId;

use super::{CatalogStore, CatalogStoreError};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS storages (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        products_count BIGINT NOT NULL DEFAULT 0 CHECK (products_count >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        locations JSONB NOT NULL DEFAULT '[]'::jsonb
    )
    "#,
    "CREATE INDEX IF NOT EXISTS products_locations_gin ON products USING GIN (locations jsonb_path_ops)",
];

/// Postgres-backed catalog store.
///
/// Cheap to clone; shares one `sqlx` pool.
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the catalog tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), CatalogStoreError> {
        for statement in SCHEMA {
            sqlx::query(*statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[instrument(skip(self), err)]
    async fn list_storages(
        &self,
        after: Option<StorageId>,
        limit: usize,
    ) -> Result<Vec<StorageRecord>, CatalogStoreError> {
        let after_param: Option<uuid::Uuid> = after.map(|id| *id.as_uuid());

        let rows = sqlx::query(
            r#"
            SELECT id, name, products_count
            FROM storages
            WHERE ($1::uuid IS NULL OR id > $1)
            ORDER BY id ASC
            LIMIT $2
            "#,
        )
        .bind(after_param)
        .bind(page_limit(limit))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_storages", e))?;

        rows.iter().map(storage_from_row).collect()
    }

    #[instrument(skip(self), fields(storage_id = %id), err)]
    async fn get_storage(&self, id: StorageId) -> Result<Option<StorageRecord>, CatalogStoreError> {
        let row = sqlx::query("SELECT id, name, products_count FROM storages WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_storage", e))?;

        row.as_ref().map(storage_from_row).transpose()
    }

    #[instrument(skip(self), fields(storage_id = %id), err)]
    async fn count_products_in_storage(&self, id: StorageId) -> Result<u64, CatalogStoreError> {
        // Containment matches any element with this storageId, whatever its
        // other fields; each product row counts once.
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM products
            WHERE locations @> jsonb_build_array(jsonb_build_object('storageId', $1::text))
            "#,
        )
        .bind(id.to_string())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_products_in_storage", e))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| CatalogStoreError::Decode(format!("failed to read count: {e}")))?;
        Ok(total.max(0) as u64)
    }

    #[instrument(skip(self), fields(storage_id = %id), err)]
    async fn set_products_count(&self, id: StorageId, count: u64) -> Result<(), CatalogStoreError> {
        let count = i64::try_from(count)
            .map_err(|_| CatalogStoreError::Query(format!("count {count} out of range")))?;

        let result = sqlx::query("UPDATE storages SET products_count = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(count)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_products_count", e))?;

        if result.rows_affected() == 0 {
            return Err(CatalogStoreError::NotFound(id));
        }
        Ok(())
    }

    async fn insert_storage(&self, storage: StorageRecord) -> Result<(), CatalogStoreError> {
        let count = i64::try_from(storage.products_count())
            .map_err(|_| CatalogStoreError::Query("products_count out of range".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO storages (id, name, products_count)
            VALUES ($1, $2, $3)
            ON CONFLICT (id)
            DO UPDATE SET name = EXCLUDED.name, products_count = EXCLUDED.products_count
            "#,
        )
        .bind(storage.id().as_uuid())
        .bind(storage.name())
        .bind(count)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_storage", e))?;
        Ok(())
    }

    async fn insert_product(&self, product: ProductRecord) -> Result<(), CatalogStoreError> {
        let locations = serde_json::to_value(product.locations())
            .map_err(|e| CatalogStoreError::Decode(format!("failed to encode locations: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, locations)
            VALUES ($1, $2, $3)
            ON CONFLICT (id)
            DO UPDATE SET name = EXCLUDED.name, locations = EXCLUDED.locations
            "#,
        )
        .bind(product.id().as_uuid())
        .bind(product.name())
        .bind(locations)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), CatalogStoreError> {
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ping", e))?;
        Ok(())
    }
}

/// SQL `LIMIT` for a page request; sizes beyond `i64::MAX` saturate.
fn page_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn storage_from_row(row: &sqlx::postgres::PgRow) -> Result<StorageRecord, CatalogStoreError> {
    let decode = |e: sqlx::Error| CatalogStoreError::Decode(format!("storage row: {e}"));

    let id: uuid::Uuid = row.try_get("id").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let count: i64 = row.try_get("products_count").map_err(decode)?;

    StorageRecord::new(StorageId::from(id), name, count.max(0) as u64)
        .map_err(|e| CatalogStoreError::Decode(format!("storage {id}: {e}")))
}

/// Map SQLx errors to CatalogStoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> CatalogStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
            CatalogStoreError::Query(format!(
                "database error in {operation} ({code}): {}",
                db_err.message()
            ))
        }
        sqlx::Error::PoolClosed => {
            CatalogStoreError::Connection(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            CatalogStoreError::Connection(format!("timed out acquiring connection in {operation}"))
        }
        sqlx::Error::Io(e) => CatalogStoreError::Connection(format!("io error in {operation}: {e}")),
        sqlx::Error::Tls(e) => CatalogStoreError::Connection(format!("tls error in {operation}: {e}")),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::TypeNotFound { .. } => {
            CatalogStoreError::Decode(format!("{operation}: {err}"))
        }
        _ => CatalogStoreError::Query(format!("sqlx error in {operation}: {err}")),
    }
}
