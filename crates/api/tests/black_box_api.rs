//! Black-box tests against the real HTTP app on an ephemeral port.

use reqwest::StatusCode;
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build the same router as prod, but bind to an ephemeral port.
        let app = stockpile_api::app::build_app();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn seed_product(client: &reqwest::Client, server: &TestServer, stock: u32) -> Value {
    // Pick an existing category so the server can denormalize its name.
    let categories: Value = client
        .get(format!("{}/api/categories", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let category_id = categories[0]["id"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{}/api/products", server.base_url))
        .json(&json!({
            "name": "Wireless earbuds",
            "description": "Compact charging case",
            "brand": "Acme",
            "categoryId": category_id,
            "priceCents": 12999,
            "stockQuantity": stock,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn health_endpoint_responds() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread")]
async fn created_product_is_searchable_and_viewable() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let product = seed_product(&client, &server, 5).await;
    let id = product["id"].as_str().unwrap();

    // Keyword search goes through the index.
    let search: Value = client
        .get(format!(
            "{}/api/products/search?keyword=earbuds",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(search["totalItems"], json!(1));
    assert_eq!(search["products"][0]["id"], json!(id));

    // Detail fetch by id.
    let detail = client
        .get(format!("{}/api/products/{}", server.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(detail.status(), StatusCode::OK);
    let detail: Value = detail.json().await.unwrap();
    assert_eq!(detail["name"], json!("Wireless earbuds"));
    assert!(!detail["categoryName"].as_str().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn blank_keyword_search_lists_active_products() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    seed_product(&client, &server, 5).await;

    let search: Value = client
        .get(format!("{}/api/products/search", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(search["totalItems"], json!(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn stock_reservation_and_restoration_round_trip() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let product = seed_product(&client, &server, 10).await;
    let id = product["id"].as_str().unwrap();

    // Reserve 6 of 10.
    let reserve: Value = client
        .put(format!(
            "{}/api/products/{}/stock?quantity=6",
            server.base_url, id
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reserve["success"], json!(true));
    assert_eq!(reserve["currentStock"], json!(4));

    // A second reservation of 6 must be refused and change nothing.
    let refused: Value = client
        .put(format!(
            "{}/api/products/{}/stock?quantity=6",
            server.base_url, id
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(refused["success"], json!(false));
    assert_eq!(refused["message"], json!("Insufficient stock"));
    assert_eq!(refused["currentStock"], json!(4));

    // Restoring brings the quantity back.
    let restored: Value = client
        .put(format!(
            "{}/api/products/{}/stock/restore?quantity=6",
            server.base_url, id
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(restored["currentStock"], json!(10));
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_product_stock_update_is_not_found() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let response = client
        .put(format!(
            "{}/api/products/00000000-0000-7000-8000-000000000000/stock?quantity=1",
            server.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn deleted_product_disappears_from_search() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let product = seed_product(&client, &server, 5).await;
    let id = product["id"].as_str().unwrap();

    let delete = client
        .delete(format!("{}/api/products/{}", server.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status(), StatusCode::OK);

    let search: Value = client
        .get(format!(
            "{}/api/products/search?keyword=earbuds",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(search["totalItems"], json!(0));
}

#[tokio::test(flavor = "multi_thread")]
async fn low_stock_listing_respects_threshold() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let product = seed_product(&client, &server, 3).await;
    let id = product["id"].as_str().unwrap();

    let low: Value = client
        .get(format!(
            "{}/api/products/low-stock?threshold=5",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(low["totalItems"], json!(1));
    assert_eq!(low["products"][0]["id"], json!(id));
}

#[tokio::test(flavor = "multi_thread")]
async fn category_listing_is_seeded() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let categories: Value = client
        .get(format!("{}/api/categories", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!categories.as_array().unwrap().is_empty());

    let hierarchy: Value = client
        .get(format!("{}/api/categories/hierarchy", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(hierarchy["categories"].as_array().is_some());
    assert!(hierarchy["subcategories"].as_object().is_some());
}
