use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockroom_infra::{CatalogStoreError, ReconciliationError};

use crate::app::dto;

pub fn store_error_to_response(err: CatalogStoreError) -> axum::response::Response {
    match err {
        CatalogStoreError::NotFound(id) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("storage {id} not found"))
        }
        CatalogStoreError::Connection(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
        }
        CatalogStoreError::Query(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg),
        CatalogStoreError::Decode(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "decode_error", msg)
        }
    }
}

/// Any failed run is a 500 carrying the original error text; causes are not
/// distinguished and partial progress is not reported.
///
/// `details` is the run error followed by the data-access failure behind it.
pub fn reconciliation_failure(err: &ReconciliationError) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(dto::ReconcileFailed {
            success: false,
            error: "Failed to reconcile storage product counts".to_string(),
            details: Some(format!("{err}: {}", err.data_access())),
        }),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
