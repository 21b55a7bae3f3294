//! HTTP API for the Signet license signing server.

mod auth;
mod error;
mod handlers;

pub use auth::{AuthContext, Principal};
pub use error::{ApiError, ApiResult};
pub use handlers::{
    CreateKeyBody, HealthResponse, ImportKeysBody, KeyResponse, LicenseResponse, PublicKeyResponse,
    SignResponse, UpdateKeyBody, VerifyBody,
};

use axum::{
    Router,
    routing::{get, post},
};
use signet_crypto::MasterKey;
use signet_store::{Database, Issuer, KeyStore, LicenseStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared state handed to every handler.
pub struct AppState {
    pub keys: KeyStore,
    pub licenses: LicenseStore,
    pub issuer: Issuer,
    pub admin_token: String,
    /// When set, each issued license is also written to `<dir>/<id>.dat`.
    pub license_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(db: Database, master_key: Arc<MasterKey>, admin_token: String) -> Self {
        let keys = KeyStore::new(db.clone(), master_key);
        Self {
            licenses: LicenseStore::new(db),
            issuer: Issuer::new(keys.clone()),
            keys,
            admin_token,
            license_dir: None,
        }
    }

    #[must_use]
    pub fn with_license_dir(mut self, dir: PathBuf) -> Self {
        self.license_dir = Some(dir);
        self
    }
}

/// Build the HTTP API router over the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/keys", post(handlers::create_key).get(handlers::list_keys))
        .route("/keys/import", post(handlers::import_keys))
        .route(
            "/keys/{key_id}",
            get(handlers::get_key)
                .patch(handlers::update_key)
                .delete(handlers::retire_key),
        )
        .route("/keys/{key_id}/public", get(handlers::public_key))
        .route("/licenses", get(handlers::list_licenses))
        .route("/licenses/sign", post(handlers::sign_license))
        .route("/licenses/verify", post(handlers::verify_license))
        .route(
            "/licenses/{id}",
            get(handlers::get_license).delete(handlers::delete_license),
        )
        .route("/licenses/{id}/download", get(handlers::download_license))
        .with_state(state)
}
