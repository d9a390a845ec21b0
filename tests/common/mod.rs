//! Shared fixtures for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use serde_json::Value;
use tower::ServiceExt;

use collab_gateway::config::GatewayConfig;
use collab_gateway::http::HttpServer;
use collab_gateway::registry::{CommentStore, Registry, RegistrySnapshot, SeedData};

/// A small platform: two users, a public and a private project, a file,
/// a custom alias and one dangling GUID.
pub const SEED: &str = r#"{
    "users": [
        {"id": "ada01", "fullname": "Ada Lovelace", "watched_logs": ["log1", "log3"]},
        {"id": "bob02", "fullname": "Bob Babbage"}
    ],
    "nodes": [
        {"id": "abc12", "title": "Replication", "is_public": true,
         "contributors": ["ada01"], "logs": ["log1", "log2"]},
        {"id": "priv9", "title": "Private notes", "contributors": ["ada01"], "logs": ["log3"]}
    ],
    "files": [
        {"id": "f1x9q", "node_id": "abc12", "name": "data.csv"}
    ],
    "logs": [
        {"id": "log1", "node_id": "abc12", "action": "project_created", "user": "ada01",
         "date": "2014-03-01T10:00:00Z"},
        {"id": "log2", "node_id": "abc12", "action": "wiki_updated", "user": "bob02",
         "date": "2014-03-02T10:00:00Z"},
        {"id": "log3", "node_id": "priv9", "action": "project_created", "user": "ada01",
         "date": "2014-03-03T10:00:00Z"}
    ],
    "guids": [
        {"key": "ezcuj", "kind": "node", "id": "abc12"},
        {"key": "lost1", "kind": "node", "id": "gone0"}
    ],
    "comments": [{
        "id": "c1",
        "target": {"kind": "node", "id": "abc12"},
        "user": "ada01",
        "payload": {"comment": "Nice work", "rating": "5"},
        "date": "2014-03-01T15:05:00Z"
    }]
}"#;

pub fn seed() -> (RegistrySnapshot, CommentStore) {
    let seed: SeedData = serde_json::from_str(SEED).unwrap();
    let (snapshot, comments) = seed.into_snapshot();
    let store = CommentStore::new();
    for comment in comments {
        store.insert(comment);
    }
    (snapshot, store)
}

pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.observability.metrics_enabled = false;
    config
}

pub fn test_server() -> HttpServer {
    let (snapshot, comments) = seed();
    HttpServer::new(test_config(), Registry::new(snapshot), comments)
}

/// Send a GET, optionally as a logged-in user.
pub async fn get(server: &HttpServer, uri: &str, user: Option<&str>) -> Response<Body> {
    let mut req = Request::builder().uri(uri);
    if let Some(user) = user {
        req = req.header("x-user-id", user);
    }
    server
        .service()
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response.headers()["location"].to_str().unwrap()
}
