//! Black-box tests against the HTTP API
//!
//! Each test serves the production router on an ephemeral port backed by the
//! in-memory store and talks to it over HTTP.

mod common;

use common::{test_config, ADMIN_PASSWORD};
use reqwest::StatusCode;
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let state = stock_ledger::build_state(test_config())
            .await
            .expect("failed to build state");
        let app = stock_ledger::create_app(state);

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

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self) -> String {
        let res = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": "admin", "password": ADMIN_PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn get_json(&self, token: &str, path: &str) -> Value {
        let res = self.get(token, path).await;
        assert_eq!(res.status(), StatusCode::OK, "GET {}", path);
        res.json().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Create `Main Warehouse` (WH001), `Store A` (WH002) and `Face Wash`
/// (PROD001, min 10) with 50 received and 15 moved to the store
async fn seed(srv: &TestServer, token: &str) {
    for name in ["Main Warehouse", "Store A"] {
        let res = srv.post(token, "/api/locations", json!({ "name": name })).await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = srv
        .post(
            token,
            "/api/products",
            json!({ "name": "Face Wash", "min_stock": 10, "initial_qty": 50 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let product: Value = res.json().await.unwrap();
    assert_eq!(product["product_id"], "PROD001");

    let res = srv
        .post(
            token,
            "/api/movements",
            json!({
                "product_id": "PROD001",
                "qty": 15,
                "from_location": "WH001",
                "to_location": "WH002"
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory connected");
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    for path in ["/api/low-stock-count", "/api/products", "/api/report/pdf"] {
        let res = srv.client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "GET {}", path);
    }

    let res = srv.get("not-a-token", "/api/products").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "username": "admin", "password": "not-the-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn low_stock_count_shape() {
    let srv = TestServer::spawn().await;
    let token = srv.login().await;

    assert_eq!(
        srv.get_json(&token, "/api/low-stock-count").await,
        json!({ "count": 0 })
    );

    seed(&srv, &token).await;
    let res = srv
        .post(
            &token,
            "/api/products",
            json!({ "name": "Serum", "min_stock": 10 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    assert_eq!(
        srv.get_json(&token, "/api/low-stock-count").await,
        json!({ "count": 1 })
    );
}

#[tokio::test]
async fn product_locations_shape() {
    let srv = TestServer::spawn().await;
    let token = srv.login().await;
    seed(&srv, &token).await;

    assert_eq!(
        srv.get_json(&token, "/api/product-locations/PROD001").await,
        json!({
            "locations": [
                { "location": "Main Warehouse", "qty": 35 },
                { "location": "Store A", "qty": 15 }
            ]
        })
    );
    assert_eq!(
        srv.get_json(&token, "/api/product-locations/PROD999").await,
        json!({ "locations": [] })
    );
}

#[tokio::test]
async fn stock_queries() {
    let srv = TestServer::spawn().await;
    let token = srv.login().await;
    seed(&srv, &token).await;

    let stock = srv.get_json(&token, "/api/products/PROD001/stock").await;
    assert_eq!(stock["total_stock"], 50);

    let balance = srv
        .get_json(&token, "/api/locations/WH002/products/PROD001/balance")
        .await;
    assert_eq!(balance["balance"], 15);

    let products = srv.get_json(&token, "/api/products").await;
    assert_eq!(products[0]["total_qty"], 50);
}

#[tokio::test]
async fn overdraw_is_rejected_with_available_quantity() {
    let srv = TestServer::spawn().await;
    let token = srv.login().await;
    seed(&srv, &token).await;

    let res = srv
        .post(
            &token,
            "/api/movements",
            json!({ "product_id": "PROD001", "qty": 16, "from_location": "WH002" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "INSUFFICIENT_STOCK");
    assert_eq!(
        body["error"]["message"],
        "Insufficient stock! Only 15 units available at this location."
    );

    let history = srv.get_json(&token, "/api/movements").await;
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn movement_without_locations_is_bad_request() {
    let srv = TestServer::spawn().await;
    let token = srv.login().await;
    seed(&srv, &token).await;

    let res = srv
        .post(
            &token,
            "/api/movements",
            json!({ "product_id": "PROD001", "qty": 5, "from_location": "", "to_location": "" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .post(
            &token,
            "/api/movements",
            json!({ "product_id": "PROD001", "qty": 0, "to_location": "WH001" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn referenced_location_delete_conflicts() {
    let srv = TestServer::spawn().await;
    let token = srv.login().await;
    seed(&srv, &token).await;

    let res = srv
        .client
        .delete(srv.url("/api/locations/WH002"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = srv
        .client
        .delete(srv.url("/api/products/PROD001"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv
        .client
        .delete(srv.url("/api/locations/WH002"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn balance_report_formats() {
    let srv = TestServer::spawn().await;
    let token = srv.login().await;
    seed(&srv, &token).await;

    let rows = srv.get_json(&token, "/api/report").await;
    assert_eq!(
        rows,
        json!([
            { "product_name": "Face Wash", "location_name": "Main Warehouse", "qty": 35 },
            { "product_name": "Face Wash", "location_name": "Store A", "qty": 15 }
        ])
    );

    let res = srv.get(&token, "/api/report?format=csv").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/csv");
    let csv = res.text().await.unwrap();
    assert!(csv.starts_with("product_name,location_name,qty\n"));

    let res = srv.get(&token, "/api/report/pdf").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/pdf");
    assert_eq!(
        res.headers()["content-disposition"],
        "attachment; filename=\"inventory_report.pdf\""
    );
    let pdf = res.bytes().await.unwrap();
    assert!(pdf.starts_with(b"%PDF-1.4"));
}

#[tokio::test]
async fn dashboard_aggregates() {
    let srv = TestServer::spawn().await;
    let token = srv.login().await;
    seed(&srv, &token).await;

    let dashboard = srv.get_json(&token, "/api/dashboard").await;
    assert_eq!(dashboard["total_products"], 1);
    assert_eq!(dashboard["total_locations"], 2);
    assert_eq!(dashboard["total_movements"], 2);
    assert_eq!(dashboard["low_stock"], json!([]));
}
