use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use stockroom_core::StorageId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_storages))
        .route("/reconcile-counts", post(reconcile_counts))
        .route("/:id/product-count", get(product_count))
}

pub async fn list_storages(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListStoragesQuery>,
) -> axum::response::Response {
    let after = match query.after.as_deref().map(str::parse::<StorageId>).transpose() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_cursor", "invalid storage cursor"),
    };
    let limit = query.limit();

    match services.catalog().list_storages(after, limit).await {
        Ok(items) => (StatusCode::OK, Json(dto::StoragePage::new(items, limit))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn reconcile_counts(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let report = match services.reconciler().run().await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("storage count reconciliation failed: {e}");
            return errors::reconciliation_failure(&e);
        }
    };

    let message = format!(
        "Storage product counts reconciled: {} of {} storages corrected",
        report.corrections.len(),
        report.storages_examined
    );

    (
        StatusCode::OK,
        Json(dto::ReconcileSucceeded {
            success: true,
            message,
            details: report.corrections,
        }),
    )
        .into_response()
}

pub async fn product_count(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let storage_id: StorageId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid storage id"),
    };

    match services.reconciler().diagnose(storage_id).await {
        Ok(Some(diagnosis)) => (StatusCode::OK, Json(diagnosis)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "storage not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
