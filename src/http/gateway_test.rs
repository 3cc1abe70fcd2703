//! Tests for the content HTTP gateway
//! 内容HTTP网关测试

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use crate::backend::MemoryBackend;
use crate::constants::{tables, SITE_CONTENT_RPC};
use crate::content::testing::seeded_backend;
use crate::content::SiteDataStore;
use crate::http::gateway::{create_gateway_router, GatewayState};

fn server_for(backend: &MemoryBackend) -> (TestServer, Arc<SiteDataStore>) {
    let store = Arc::new(SiteDataStore::new(Arc::new(backend.clone())));
    let router = create_gateway_router(GatewayState {
        store: store.clone(),
    });
    (TestServer::new(router).unwrap(), store)
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = server_for(&seeded_backend());

    let resp = server.get("/health").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["content"], "empty");
    assert_eq!(body["service"], "festival-site");
}

#[tokio::test]
async fn test_get_content_loads_on_first_request() {
    let backend = seeded_backend();
    let (server, store) = server_for(&backend);

    let resp = server.get("/api/content").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["source"], "batched");
    assert_eq!(body["error"], Value::Null);
    assert_eq!(body["data"]["heroContent"]["title"], "Kalpana 2025");
    assert_eq!(body["data"]["statistics"][0]["label"], "Events");
    assert_eq!(backend.calls().rpcs, 1);

    // Served from the cached aggregate / 由缓存的聚合提供
    server.get("/api/content").await.assert_status_ok();
    assert_eq!(backend.calls().rpcs, 1);
    assert!(store.data().is_some());
}

#[tokio::test]
async fn test_get_section() {
    let (server, _) = server_for(&seeded_backend());

    let resp = server.get("/api/content/staffMembers").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["section"], "staffMembers");
    assert_eq!(body["status"], "ready");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let resp = server.get("/api/content/hero_content").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["data"]["title"], "Kalpana 2025");
}

#[tokio::test]
async fn test_unknown_section_is_bad_request() {
    let backend = seeded_backend();
    let (server, _) = server_for(&backend);

    let resp = server.get("/api/content/sponsors").await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "Invalid input: unknown section: sponsors");
    assert_eq!(backend.calls().rpcs, 0);
}

#[tokio::test]
async fn test_total_failure_is_unavailable() {
    let backend = MemoryBackend::new();
    let (server, _) = server_for(&backend);

    let resp = server.get("/api/content").await;
    resp.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = resp.json();
    assert_eq!(body["status"], "error");
    assert_eq!(body["data"], Value::Null);
    assert!(body["error"].as_str().unwrap().starts_with("all content queries failed"));
}

#[tokio::test]
async fn test_refresh_content_reloads() {
    let backend = seeded_backend();
    let (server, _) = server_for(&backend);
    server.get("/api/content").await.assert_status_ok();

    backend.set_rpc_response(SITE_CONTENT_RPC, json!({ "statistics": [] }));
    let resp = server.post("/api/content/refresh").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["data"]["statistics"], json!([]));
    assert_eq!(backend.calls().rpcs, 2);
}

#[tokio::test]
async fn test_refresh_section_merges_fresh_rows() {
    let backend = seeded_backend();
    let (server, store) = server_for(&backend);
    server.get("/api/content").await.assert_status_ok();

    backend.set_table(
        tables::STATISTICS,
        vec![json!({ "id": 9, "label": "Workshops", "value": "6", "order": 1 })],
    );
    let resp = server.post("/api/content/statistics/refresh").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["data"][0]["label"], "Workshops");
    assert_eq!(store.data().unwrap().statistics.len(), 1);
}

#[tokio::test]
async fn test_refresh_section_failure_keeps_previous_data() {
    let backend = seeded_backend();
    let (server, _) = server_for(&backend);
    server.get("/api/content").await.assert_status_ok();

    backend.fail_table(tables::EVENTS, "connection reset");
    let resp = server.post("/api/content/events/refresh").await;
    resp.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = resp.json();
    assert_eq!(body["error"], "connection reset");
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_refresh_section_before_load_is_conflict() {
    let backend = seeded_backend();
    let (server, _) = server_for(&backend);

    let resp = server.post("/api/content/events/refresh").await;
    resp.assert_status(StatusCode::CONFLICT);
    assert_eq!(backend.select_count(tables::EVENTS), 0);
}
