use std::sync::Arc;

use chrono::Utc;
use reqwest::StatusCode;
use serde_json::{json, Value};

use stockroom_api::app::{build_app, AppServices};
use stockroom_core::{BaseProductId, VariantId};
use stockroom_infra::{Collection, InMemoryCollectionGateway};
use stockroom_products::{BaseProduct, Variant};
use stockroom_reconcile::EngineConfig;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(gateway: Arc<InMemoryCollectionGateway>) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let services = Arc::new(AppServices::new(gateway, EngineConfig::default()));
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
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn seeded_catalog() -> Arc<InMemoryCollectionGateway> {
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    for (id, name) in [("base-1", "Leche X"), ("base-2", "Leche X Dup")] {
        let product = BaseProduct::new(BaseProductId::parse(id).unwrap(), name, Utc::now());
        gateway.insert(Collection::BaseProducts, &product).unwrap();
    }
    for (id, base, ean) in [
        ("v1", "base-1", "7501234567890"),
        ("v2", "base-1", "7501000000028"),
        ("v3", "base-2", "7501234567890"),
        ("v4", "base-2", "7501000000042"),
        ("v5", "base-gone", "7501000000059"),
    ] {
        let variant = Variant::new(
            VariantId::parse(id).unwrap(),
            BaseProductId::parse(base).unwrap(),
            format!("{id} 1 L"),
            Utc::now(),
        )
        .with_ean(ean);
        gateway.insert(Collection::Variants, &variant).unwrap();
    }
    gateway
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn(Arc::new(InMemoryCollectionGateway::new())).await;
    let res = server
        .client
        .get(format!("{}/health", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicates_and_orphans_are_listed() {
    let server = TestServer::spawn(seeded_catalog()).await;

    let (status, groups) = server.get("/reconcile/duplicates").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(groups.as_array().unwrap().len(), 1);
    assert_eq!(groups[0]["ean"], "7501234567890");
    assert_eq!(groups[0]["count"], 2);
    assert_eq!(groups[0]["variants"][0]["baseProductName"], "Leche X");

    let (status, orphans) = server.get("/reconcile/orphans").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orphans, json!([{
        "id": "v5",
        "fullName": "v5 1 L",
        "ean": "7501000000059",
        "baseProductId": "base-gone",
    }]));
}

#[tokio::test]
async fn preview_then_merge() {
    let gateway = seeded_catalog();
    let server = TestServer::spawn(gateway.clone()).await;
    let request = json!({ "targetId": "base-1", "sourceIds": ["base-2"] });

    let (status, preview) = server.post("/reconcile/merge/preview", request.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["totalVariantsToReassign"], 2);
    assert_eq!(gateway.len(Collection::BaseProducts), 2);

    let (status, report) = server.post("/reconcile/merge", request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["success"], true);
    assert_eq!(report["variantsReasignadas"], 2);
    assert_eq!(report["productosEliminados"], 1);
    assert_eq!(report["errors"], json!([]));
    assert_eq!(report["sources"][0]["state"], "done");
    assert_eq!(gateway.len(Collection::BaseProducts), 1);
}

#[tokio::test]
async fn merge_failures_are_reported_in_the_body() {
    let server = TestServer::spawn(seeded_catalog()).await;

    let (status, report) = server
        .post(
            "/reconcile/merge",
            json!({ "targetId": "base-404", "sourceIds": ["base-2"] }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["success"], false);
    assert_eq!(report["status"], "failed");
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let server = TestServer::spawn(seeded_catalog()).await;

    let (status, body) = server
        .post("/reconcile/merge", json!({ "targetId": "base-1", "sourceIds": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = server
        .post(
            "/reconcile/merge/preview",
            json!({ "targetId": "base-404", "sourceIds": ["base-2"] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn variants_are_reassigned_one_and_many() {
    let server = TestServer::spawn(seeded_catalog()).await;

    let (status, body) = server
        .post(
            "/reconcile/variants/v1/reassign",
            json!({ "newBaseProductId": "base-2" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = server
        .post(
            "/reconcile/variants/reassign",
            json!({ "variantIds": ["v1", "bad-id", "v2"], "newBaseProductId": "base-2" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["successCount"], 2);
    assert_eq!(
        body["errors"],
        json!([{ "variantId": "bad-id", "message": "variant not found" }])
    );
}
