//! Signing key routes.

use super::{ApiJson, blocking};
use crate::AppState;
use crate::auth::AuthContext;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signet_store::{ImportSummary, KeyImport, SigningKeyRecord};
use std::sync::Arc;
use tracing::info;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreateKeyBody {
    pub key_id: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UpdateKeyBody {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ImportKeysBody {
    pub keys: Vec<KeyImport>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KeyResponse {
    pub key_id: String,
    pub public_key_b64: String,
    pub has_private_key: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SigningKeyRecord> for KeyResponse {
    fn from(record: SigningKeyRecord) -> Self {
        Self {
            public_key_b64: record.public_key.to_base64(),
            key_id: record.key_id,
            has_private_key: record.has_private_key,
            notes: record.notes,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PublicKeyResponse {
    pub key_id: String,
    pub public_key_b64: String,
}

pub async fn create_key(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    ApiJson(body): ApiJson<CreateKeyBody>,
) -> ApiResult<(StatusCode, Json<KeyResponse>)> {
    let keys = state.keys.clone();
    let record = blocking(move || keys.create(&body.key_id, body.notes.as_deref())).await?;
    info!(key_id = %record.key_id, actor = %auth.principal(), "created signing key");
    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn import_keys(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    ApiJson(body): ApiJson<ImportKeysBody>,
) -> ApiResult<Json<ImportSummary>> {
    let keys = state.keys.clone();
    let summary = blocking(move || keys.import(&body.keys)).await?;
    info!(total = summary.total, actor = %auth.principal(), "imported signing keys");
    Ok(Json(summary))
}

pub async fn list_keys(State(state): State<Arc<AppState>>, _auth: AuthContext) -> ApiResult<Json<Vec<KeyResponse>>> {
    let keys = state.keys.clone();
    let records = blocking(move || keys.list()).await?;
    Ok(Json(records.into_iter().map(KeyResponse::from).collect()))
}

pub async fn get_key(
    State(state): State<Arc<AppState>>,
    _auth: AuthContext,
    Path(key_id): Path<String>,
) -> ApiResult<Json<KeyResponse>> {
    let keys = state.keys.clone();
    let record = blocking(move || keys.get(&key_id)).await?;
    Ok(Json(record.into()))
}

pub async fn update_key(
    State(state): State<Arc<AppState>>,
    _auth: AuthContext,
    Path(key_id): Path<String>,
    ApiJson(body): ApiJson<UpdateKeyBody>,
) -> ApiResult<Json<KeyResponse>> {
    let keys = state.keys.clone();
    let record = blocking(move || keys.update_notes(&key_id, body.notes.as_deref())).await?;
    Ok(Json(record.into()))
}

pub async fn retire_key(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(key_id): Path<String>,
) -> ApiResult<StatusCode> {
    let keys = state.keys.clone();
    let id = key_id.clone();
    blocking(move || keys.retire(&id)).await?;
    info!(key_id = %key_id, actor = %auth.principal(), "retired signing key");
    Ok(StatusCode::NO_CONTENT)
}

/// Public half of a key, retired or not. Needs no authorization.
pub async fn public_key(
    State(state): State<Arc<AppState>>,
    Path(key_id): Path<String>,
) -> ApiResult<Json<PublicKeyResponse>> {
    let keys = state.keys.clone();
    let id = key_id.clone();
    let public_key = blocking(move || keys.public_key(&id)).await?;
    Ok(Json(PublicKeyResponse {
        key_id,
        public_key_b64: public_key.to_base64(),
    }))
}
