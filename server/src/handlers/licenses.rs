//! License issuance, verification and retrieval routes.

use super::{ApiJson, blocking};
use crate::AppState;
use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signet_license::{
    Edition, FILE_EXTENSION, LicenseError, LicenseRequest, PortableLicense, VerificationReport,
};
use signet_store::{LicenseRecord, StoreError};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SignResponse {
    pub id: Uuid,
    pub payload_b64: String,
    pub signature_b64: String,
    /// The portable file contents.
    pub license_file: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VerifyBody {
    pub payload_b64: String,
    pub signature_b64: String,
    pub public_key_b64: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LicenseResponse {
    pub id: Uuid,
    pub key_id: String,
    pub customer: String,
    pub edition: Edition,
    pub seats: u32,
    pub issued_at: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub validity_days: u32,
    pub fingerprint_id: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub payload_b64: String,
    pub signature_b64: String,
}

impl From<LicenseRecord> for LicenseResponse {
    fn from(record: LicenseRecord) -> Self {
        let file = record.portable();
        Self {
            id: record.id,
            key_id: record.key_id,
            customer: record.customer,
            edition: record.edition,
            seats: record.seats,
            issued_at: record.issued_at,
            expires: record.expires,
            validity_days: record.validity_days,
            fingerprint_id: record.fingerprint_id,
            notes: record.notes,
            created_at: record.created_at,
            payload_b64: file.payload_b64(),
            signature_b64: file.signature_b64(),
        }
    }
}

pub async fn sign_license(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    ApiJson(request): ApiJson<LicenseRequest>,
) -> ApiResult<(StatusCode, Json<SignResponse>)> {
    let issuer = state.issuer.clone();
    let license_dir = state.license_dir.clone();

    let issued = blocking(move || {
        let issued = issuer.issue(&request)?;
        if let Some(dir) = license_dir {
            let path = mirror_path(&dir, issued.record.id);
            // The row is committed; a failed mirror does not undo the issue.
            if let Err(e) = issued.file.write_to(&path) {
                warn!(license_id = %issued.record.id, path = %path.display(), "failed to mirror license file: {e}");
            }
        }
        Ok(issued)
    })
    .await?;

    info!(license_id = %issued.record.id, actor = %auth.principal(), "signed license");
    Ok((
        StatusCode::CREATED,
        Json(SignResponse {
            id: issued.record.id,
            payload_b64: issued.file.payload_b64(),
            signature_b64: issued.file.signature_b64(),
            license_file: issued.file.encode(),
        }),
    ))
}

/// Checks a license against caller-supplied public key bytes.
///
/// Signature and expiry are reported independently; a bad signature is a
/// `200` with `signature_valid: false`, not an error.
pub async fn verify_license(
    _auth: AuthContext,
    ApiJson(body): ApiJson<VerifyBody>,
) -> ApiResult<Json<VerificationReport>> {
    let public_key = STANDARD
        .decode(body.public_key_b64.trim())
        .map_err(|e| LicenseError::MalformedInput(format!("public_key_b64 is not valid base64: {e}")))?;
    let file = PortableLicense::from_base64_parts(&body.payload_b64, &body.signature_b64)?;
    let report = signet_license::verify_license(&file, &public_key, Utc::now())?;
    Ok(Json(report))
}

pub async fn list_licenses(
    State(state): State<Arc<AppState>>,
    _auth: AuthContext,
) -> ApiResult<Json<Vec<LicenseResponse>>> {
    let licenses = state.licenses.clone();
    let records = blocking(move || licenses.list()).await?;
    Ok(Json(records.into_iter().map(LicenseResponse::from).collect()))
}

pub async fn get_license(
    State(state): State<Arc<AppState>>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<LicenseResponse>> {
    let id = parse_license_id(&id)?;
    let licenses = state.licenses.clone();
    let record = blocking(move || licenses.get(id)).await?;
    Ok(Json(record.into()))
}

/// Serves the two-line portable file as an attachment.
pub async fn download_license(
    State(state): State<Arc<AppState>>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_license_id(&id)?;
    let licenses = state.licenses.clone();
    let record = blocking(move || licenses.get(id)).await?;

    let disposition = format!("attachment; filename=\"{}\"", record.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        record.portable().encode(),
    )
        .into_response())
}

pub async fn delete_license(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_license_id(&id)?;
    let licenses = state.licenses.clone();
    blocking(move || licenses.delete(id)).await?;

    if let Some(dir) = &state.license_dir {
        let path = mirror_path(dir, id);
        // The row is already deleted; a stale mirror is logged, not fatal.
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(license_id = %id, path = %path.display(), "failed to remove license file: {e}"),
        }
    }

    info!(license_id = %id, actor = %auth.principal(), "deleted license");
    Ok(StatusCode::NO_CONTENT)
}

/// Where a license is mirrored inside the license directory.
fn mirror_path(dir: &FsPath, id: Uuid) -> PathBuf {
    dir.join(format!("{id}.{FILE_EXTENSION}"))
}

/// Ids that are not UUIDs cannot name a license.
fn parse_license_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::Store(StoreError::NotFound(format!("license {id}"))))
}
