use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use catalog_api::config::ServerConfig;
use catalog_api::router::build_app_router;
use catalog_api::state::AppState;
use catalog_core::store::MemoryResourceStore;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerConfig::default()
    }
}

/// Build the full application router over a fresh in-memory store.
///
/// Uses the same builder as `main.rs`, so tests exercise the production
/// middleware stack. Clone the router to send several requests against the
/// same store.
pub fn build_test_app() -> Router {
    let config = test_config();
    let state = AppState::new(config.clone(), Arc::new(MemoryResourceStore::new()));
    build_app_router(state, &config)
}

/// A valid creation payload.
pub fn boot_payload() -> serde_json::Value {
    serde_json::json!({
        "sku": "ME888SHM70XSB",
        "seller": "mega_boots",
        "campaign_code": "90",
        "product_name": "Bota Mega Boots 6000",
        "brand": "Mega Boots",
        "category": "calcados",
        "subcategory": "calcados-masculinos",
        "size": "40",
        "list_price": 199.90,
        "price": 149.90
    })
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read a response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn send(app: Router, method: Method, uri: &str, body: Body) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Body::empty()).await
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Body::from(json.to_string())).await
}

pub async fn put_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, Body::from(json.to_string())).await
}

pub async fn patch_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    send(app, Method::PATCH, uri, Body::from(json.to_string())).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Body::empty()).await
}

pub const BOUNDARY: &str = "catalog-test-boundary";

/// Encode a single multipart form part.
pub fn multipart_part(name: &str, file_name: Option<&str>, content: &str) -> String {
    let disposition = match file_name {
        Some(file_name) => {
            format!("form-data; name=\"{name}\"; filename=\"{file_name}\"")
        }
        None => format!("form-data; name=\"{name}\""),
    };
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: text/csv\r\n\r\n{content}\r\n"
    )
}

/// POST a multipart form built from already-encoded parts.
pub async fn post_multipart(app: Router, uri: &str, parts: &[String]) -> Response<Body> {
    let body = format!("{}--{BOUNDARY}--\r\n", parts.concat());
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}
