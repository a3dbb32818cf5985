use std::sync::Arc;

use reqwest::StatusCode;

use stockroom_api::app::{build_app, AppServices};
use stockroom_catalog::{LocationAssignment, ProductRecord, StorageRecord};
use stockroom_core::{ProductId, StorageId};
use stockroom_infra::catalog_store::{FaultPlan, InMemoryCatalogStore};
use stockroom_infra::{CatalogStore, ReconcileOptions};

struct TestServer {
    base_url: String,
    store: Arc<InMemoryCatalogStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over an in-memory catalog, on an ephemeral port.
        let store = Arc::new(InMemoryCatalogStore::new());
        let services = AppServices::new(store.clone(), ReconcileOptions::default().with_page_size(2));
        let app = build_app(services);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            handle,
        }
    }

    async fn add_storage(&self, name: &str, cached: u64) -> StorageId {
        let storage = StorageRecord::new(StorageId::new(), name, cached).unwrap();
        let id = storage.id();
        self.store.insert_storage(storage).await.unwrap();
        id
    }

    async fn add_products(&self, storage_id: StorageId, n: usize) {
        for i in 0..n {
            let product = ProductRecord::new(
                ProductId::new(),
                format!("Lipstick #{i}"),
                vec![LocationAssignment::new(storage_id, 12)],
            )
            .unwrap();
            self.store.insert_product(product).await.unwrap();
        }
    }

    async fn cached_count(&self, id: StorageId) -> u64 {
        self.store.get_storage(id).await.unwrap().unwrap().products_count()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_and_readiness() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/health", srv.base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(format!("{}/ready", srv.base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn reconcile_reports_and_applies_corrections() {
    let srv = TestServer::spawn().await;
    let drifted = srv.add_storage("Warehouse A", 5).await;
    srv.add_products(drifted, 3).await;
    let empty = srv.add_storage("Warehouse B", 0).await;

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/storages/reconcile-counts", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().contains("1 of 2"));

    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["storageId"], drifted.to_string());
    assert_eq!(details[0]["oldCount"], 5);
    assert_eq!(details[0]["newCount"], 3);

    assert_eq!(srv.cached_count(drifted).await, 3);
    assert_eq!(srv.cached_count(empty).await, 0);

    // Second run: nothing left to fix.
    let res = client
        .post(format!("{}/storages/reconcile-counts", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["details"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reconcile_failure_is_a_500_with_original_error() {
    let srv = TestServer::spawn().await;
    for i in 0..3 {
        let id = srv.add_storage(&format!("Shelf {i}"), 4).await;
        srv.add_products(id, 1).await;
    }
    srv.store.set_faults(FaultPlan::default().fail_count_query_on(2));

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/storages/reconcile-counts", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().len() > 0);
    let details = body["details"].as_str().unwrap();
    assert!(details.starts_with("failed to reconcile storage"));
    assert_eq!(details.matches("product catalog unreachable").count(), 1);

    // The first storage was fixed before the failure and stays fixed.
    assert_eq!(srv.store.writes(), 1);
}

#[tokio::test]
async fn product_count_diagnosis() {
    let srv = TestServer::spawn().await;
    let id = srv.add_storage("Salon shelf", 1).await;
    srv.add_products(id, 4).await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/storages/{}/product-count", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["storageId"], id.to_string());
    assert_eq!(body["name"], "Salon shelf");
    assert_eq!(body["cachedCount"], 1);
    assert_eq!(body["actualCount"], 4);
    assert_eq!(body["inSync"], false);

    // Diagnosis never writes.
    assert_eq!(srv.cached_count(id).await, 1);

    let res = client
        .get(format!("{}/storages/{}/product-count", srv.base_url, StorageId::new()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/storages/not-an-id/product-count", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn storages_are_listed_page_by_page() {
    let srv = TestServer::spawn().await;
    let mut ids = Vec::new();
    for i in 0..3 {
        ids.push(srv.add_storage(&format!("Bay {i}"), 0).await);
    }
    ids.sort();

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/storages?limit=2", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let first: serde_json::Value = res.json().await.unwrap();
    assert_eq!(first["items"].as_array().unwrap().len(), 2);
    let cursor = first["nextCursor"].as_str().unwrap().to_string();
    assert_eq!(cursor, ids[1].to_string());

    let res = client
        .get(format!("{}/storages?limit=2&after={}", srv.base_url, cursor))
        .send()
        .await
        .unwrap();
    let second: serde_json::Value = res.json().await.unwrap();
    let items = second["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], ids[2].to_string());
    assert!(second.get("nextCursor").is_none());

    let res = client
        .get(format!("{}/storages?after=garbage", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
