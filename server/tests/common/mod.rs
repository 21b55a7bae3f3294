//! Shared helpers for API tests.

#![allow(dead_code)]

use signet_crypto::MasterKey;
use signet_server::{AppState, build_router};
use signet_store::Database;
use std::path::PathBuf;
use std::sync::Arc;

pub const ADMIN_TOKEN: &str = "test-admin-token";

pub struct TestServer {
    pub base: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(ADMIN_TOKEN)
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(ADMIN_TOKEN)
    }

    pub fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(ADMIN_TOKEN)
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(ADMIN_TOKEN)
    }
}

/// Spin up the HTTP server on an OS-assigned port over an in-memory store.
pub async fn spawn_test_server() -> TestServer {
    spawn_with(None).await
}

pub async fn spawn_with(license_dir: Option<PathBuf>) -> TestServer {
    let db = Database::open_in_memory().unwrap();
    let mut state = AppState::new(db, Arc::new(MasterKey::from_bytes([3u8; 32])), ADMIN_TOKEN.to_string());
    if let Some(dir) = license_dir {
        state = state.with_license_dir(dir);
    }
    let app = build_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

pub fn acme_body(key_id: &str) -> serde_json::Value {
    serde_json::json!({
        "key_id": key_id,
        "customer": "Acme School",
        "edition": "Pro",
        "validity_days": 365,
        "seats": 50,
        "fingerprint_id": "a1b2c3d4e5f60718",
    })
}
