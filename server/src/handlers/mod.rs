//! Request handlers and wire types.

mod keys;
mod licenses;

pub use keys::{
    CreateKeyBody, ImportKeysBody, KeyResponse, PublicKeyResponse, UpdateKeyBody, create_key, get_key,
    import_keys, list_keys, public_key, retire_key, update_key,
};
pub use licenses::{
    LicenseResponse, SignResponse, VerifyBody, delete_license, download_license, get_license,
    list_licenses, sign_license, verify_license,
};

use crate::error::{ApiError, ApiResult};
use axum::{extract::FromRequest, response::Json};
use serde::{Deserialize, Serialize};
use signet_store::StoreResult;

/// JSON body extractor whose rejections use the API error format.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub(crate) struct ApiJson<T>(pub T);

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Runs a store operation on the blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("store task failed: {e}")))?
        .map_err(ApiError::from)
}
