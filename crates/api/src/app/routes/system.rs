use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::errors;
use crate::app::services::AppServices;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Ready once the catalog store answers.
pub async fn ready(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.catalog().ping().await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            tracing::warn!("readiness check failed: {e}");
            errors::json_error(StatusCode::SERVICE_UNAVAILABLE, "not_ready", e.to_string())
        }
    }
}
