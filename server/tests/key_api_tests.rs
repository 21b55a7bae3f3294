mod common;

use base64::{Engine, engine::general_purpose::STANDARD};
use common::{acme_body, spawn_test_server};
use serde_json::{Value, json};
use signet_license::generate_key_pair;
use signet_server::{HealthResponse, KeyResponse, PublicKeyResponse};

#[tokio::test]
async fn health_needs_no_token() {
    let server = spawn_test_server().await;
    let resp = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: HealthResponse = resp.json().await.unwrap();
    assert_eq!(body.status, "ok");
    assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn admin_routes_reject_missing_or_wrong_token() {
    let server = spawn_test_server().await;

    let resp = reqwest::get(server.url("/keys")).await.unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    let resp = server
        .client
        .get(server.url("/keys"))
        .bearer_auth("wrong-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = server
        .client
        .post(server.url("/licenses/sign"))
        .header("Authorization", common::ADMIN_TOKEN)
        .json(&acme_body("prod-2025"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn create_and_fetch_key() {
    let server = spawn_test_server().await;
    let resp = server
        .post("/keys")
        .json(&json!({"key_id": "prod-2025", "notes": "primary"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let created: KeyResponse = resp.json().await.unwrap();
    assert_eq!(created.key_id, "prod-2025");
    assert_eq!(created.notes.as_deref(), Some("primary"));
    assert_eq!(STANDARD.decode(&created.public_key_b64).unwrap().len(), 32);

    let fetched: KeyResponse = server.get("/keys/prod-2025").send().await.unwrap().json().await.unwrap();
    assert_eq!(fetched, created);

    let listed: Vec<KeyResponse> = server.get("/keys").send().await.unwrap().json().await.unwrap();
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn response_never_contains_private_material() {
    let server = spawn_test_server().await;
    let body: Value = server
        .post("/keys")
        .json(&json!({"key_id": "k"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let fields: Vec<&String> = body.as_object().unwrap().keys().collect();
    assert!(fields.iter().all(|f| !f.contains("private") || *f == "has_private_key"));
}

#[tokio::test]
async fn duplicate_key_is_conflict() {
    let server = spawn_test_server().await;
    let body = json!({"key_id": "prod-2025"});
    assert_eq!(server.post("/keys").json(&body).send().await.unwrap().status(), 201);

    let resp = server.post("/keys").json(&body).send().await.unwrap();
    assert_eq!(resp.status(), 409);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"], "duplicate_key_id");
}

#[tokio::test]
async fn unknown_key_is_404() {
    let server = spawn_test_server().await;
    let resp = server.get("/keys/missing").send().await.unwrap();
    assert_eq!(resp.status(), 404);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"], "not_found");
}

#[tokio::test]
async fn update_notes() {
    let server = spawn_test_server().await;
    server.post("/keys").json(&json!({"key_id": "k"})).send().await.unwrap();

    let resp = server.patch("/keys/k").json(&json!({"notes": "rotated Q3"})).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let updated: KeyResponse = resp.json().await.unwrap();
    assert_eq!(updated.notes.as_deref(), Some("rotated Q3"));
}

#[tokio::test]
async fn retire_conflicts_while_license_active() {
    let server = spawn_test_server().await;
    server.post("/keys").json(&json!({"key_id": "prod-2025"})).send().await.unwrap();
    let signed: Value = server
        .post("/licenses/sign")
        .json(&acme_body("prod-2025"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let resp = server.delete("/keys/prod-2025").send().await.unwrap();
    assert_eq!(resp.status(), 409);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"], "key_in_use");

    let id = signed["id"].as_str().unwrap();
    assert_eq!(server.delete(&format!("/licenses/{id}")).send().await.unwrap().status(), 204);
    assert_eq!(server.delete("/keys/prod-2025").send().await.unwrap().status(), 204);
    assert_eq!(server.get("/keys/prod-2025").send().await.unwrap().status(), 404);
}

#[tokio::test]
async fn public_key_is_open_and_survives_retirement() {
    let server = spawn_test_server().await;
    let created: KeyResponse = server
        .post("/keys")
        .json(&json!({"key_id": "old"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    server.delete("/keys/old").send().await.unwrap();

    let resp = reqwest::get(server.url("/keys/old/public")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: PublicKeyResponse = resp.json().await.unwrap();
    assert_eq!(body.key_id, "old");
    assert_eq!(body.public_key_b64, created.public_key_b64);
}

#[tokio::test]
async fn import_reports_counts() {
    let server = spawn_test_server().await;
    let (public, private) = generate_key_pair().unwrap();

    let resp = server
        .post("/keys/import")
        .json(&json!({"keys": [
            {
                "key_id": "imported",
                "public_key_b64": public.to_base64(),
                "private_key_b64": STANDARD.encode(&private.seed()[..]),
            },
            {
                "key_id": "broken",
                "public_key_b64": "not base64!",
            },
        ]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let summary: Value = resp.json().await.unwrap();
    assert_eq!(summary["imported"], 1);
    assert_eq!(summary["skipped"], 1);
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["errors"][0]["key_id"], "broken");

    let resp = server.post("/licenses/sign").json(&acme_body("imported")).send().await.unwrap();
    assert_eq!(resp.status(), 201);
}

#[tokio::test]
async fn malformed_json_body_is_400() {
    let server = spawn_test_server().await;
    let resp = server
        .post("/keys")
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"], "malformed_input");
}
