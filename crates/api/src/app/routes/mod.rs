use axum::{routing::get, Router};

pub mod storages;
pub mod system;

/// Router for the catalog endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/ready", get(system::ready))
        .nest("/storages", storages::router())
}
