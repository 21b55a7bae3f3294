//! Bearer-token authorization.
//!
//! Handlers that need authorization take an [`AuthContext`] argument. The
//! extractor rejects the request unless the `Authorization` header carries
//! the configured admin token; any missing, malformed or unconfigured state
//! is a rejection.

use crate::AppState;
use crate::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

/// The authorization decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    principal: Principal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Admin,
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
        }
    }
}

impl AuthContext {
    #[must_use]
    pub fn principal(&self) -> Principal {
        self.principal
    }
}

impl FromRequestParts<Arc<AppState>> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);

        match presented {
            Some(token) if token_matches(token, &state.admin_token) => Ok(Self {
                principal: Principal::Admin,
            }),
            _ => {
                warn!(path = %parts.uri.path(), "rejected unauthorized request");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

fn token_matches(presented: &str, expected: &str) -> bool {
    if expected.is_empty() || presented.len() != expected.len() {
        return false;
    }
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}
