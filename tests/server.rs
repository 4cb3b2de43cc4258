//! HTTP API tests against a live server on a free local port.

use catalog_store::config::Config;
use catalog_store::server::run_server;
use catalog_store::{CatalogStore, JsonCatalog};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

// ─── Helpers ────────────────────────────────────────────────────────

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

/// Starts a server over a fresh catalog and returns its base URL.
async fn start_server(tmp: &TempDir) -> String {
    let port = find_free_port();
    let mut cfg = Config::with_store_path(tmp.path().join("products.json"));
    cfg.server.bind = format!("127.0.0.1:{}", port);

    let catalog: Arc<dyn CatalogStore> = Arc::new(JsonCatalog::new(cfg.store.path.clone()));
    tokio::spawn(async move {
        run_server(&cfg, catalog).await.unwrap();
    });
    wait_for_server(port).await;
    format!("http://127.0.0.1:{}", port)
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;

    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_crud_round_trip() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;
    let client = reqwest::Client::new();

    // create
    let resp = client
        .post(format!("{}/products", base))
        .json(&json!({ "name": "Mug", "price": "12.5", "images": ["/m.jpg"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["slug"], "mug");
    assert_eq!(created["price"], 12.5);
    let id = created["id"].as_str().unwrap().to_string();

    // list
    let list: Value = client
        .get(format!("{}/products", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["products"].as_array().unwrap().len(), 1);

    // get by id and slug
    let resp = client.get(format!("{}/products/{}", base, id)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let resp = client.get(format!("{}/products/slug/mug", base)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let by_slug: Value = resp.json().await.unwrap();
    assert_eq!(by_slug["id"], id.as_str());

    // update
    let resp = client
        .patch(format!("{}/products/{}", base, id))
        .json(&json!({ "price": 50 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["price"], 50.0);
    assert_eq!(updated["images"], json!(["/m.jpg"]));

    // delete
    let resp = client.delete(format!("{}/products/{}", base, id)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["deleted"], true);

    let resp = client.get(format!("{}/products/{}", base, id)).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    // the file on disk matches
    let on_disk: Vec<Value> =
        serde_json::from_str(&std::fs::read_to_string(tmp.path().join("products.json")).unwrap())
            .unwrap();
    assert!(on_disk.is_empty());
}

#[tokio::test]
async fn test_error_statuses() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/products", base))
        .json(&json!({ "name": "Mug" }))
        .send()
        .await
        .unwrap();

    // conflict
    let resp = client
        .post(format!("{}/products", base))
        .json(&json!({ "name": "MUG" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "conflict");

    // validation
    let resp = client
        .post(format!("{}/products", base))
        .json(&json!({ "price": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    // malformed body
    let resp = client
        .post(format!("{}/products", base))
        .header("content-type", "application/json")
        .body("{ nope")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // not found
    for resp in [
        client.get(format!("{}/products/missing", base)).send().await.unwrap(),
        client.get(format!("{}/products/slug/missing", base)).send().await.unwrap(),
        client
            .put(format!("{}/products/missing", base))
            .json(&json!({ "price": 1 }))
            .send()
            .await
            .unwrap(),
        client.delete(format!("{}/products/missing", base)).send().await.unwrap(),
    ] {
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "not_found");
    }
}
