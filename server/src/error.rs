//! HTTP error mapping.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use signet_license::LicenseError;
use signet_store::StoreError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or invalid admin token")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    License(#[from] LicenseError),

    /// The request body could not be read as JSON.
    #[error("malformed request body: {0}")]
    BadRequest(String),

    /// The body is JSON but does not have the expected shape.
    #[error("invalid request body: {0}")]
    Unprocessable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => Self::Unprocessable(e.body_text()),
            other => Self::BadRequest(other.body_text()),
        }
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "malformed_input"),
            Self::Unprocessable(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            Self::License(e) => license_status(e),
            Self::Store(e) => match e {
                StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                StoreError::DuplicateKeyId(_) => (StatusCode::CONFLICT, "duplicate_key_id"),
                StoreError::KeyInUse(_) => (StatusCode::CONFLICT, "key_in_use"),
                StoreError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
                StoreError::KeyUnavailable(_) => (StatusCode::INTERNAL_SERVER_ERROR, "key_unavailable"),
                StoreError::License(e) => license_status(e),
                StoreError::Database(_) | StoreError::Encryption(_) | StoreError::LockPoisoned => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal")
                }
            },
        }
    }
}

fn license_status(e: &LicenseError) -> (StatusCode, &'static str) {
    match e {
        LicenseError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
        LicenseError::MalformedInput(_) => (StatusCode::BAD_REQUEST, "malformed_input"),
        LicenseError::MalformedFile(_) => (StatusCode::BAD_REQUEST, "malformed_file"),
        LicenseError::KeyGeneration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "key_generation"),
        LicenseError::Canonical(_)
        | LicenseError::InvalidPayload(_)
        | LicenseError::Serialization(_)
        | LicenseError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Storage and I/O details stay in the log.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR && code == "internal" {
            error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}
