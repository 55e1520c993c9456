//! Identity resolution for inbound requests.
//!
//! Owner scoping always comes from the resolved session, never from request
//! parameters or bodies.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::models::OwnerId;
use crate::state::AppState;
use crate::store::StoreError;
use crate::utils::error::AppError;

pub mod session;

pub use session::{PgSessionResolver, StaticIdentityResolver};

/// Looks up the identity behind a session credential.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `Ok(None)` means the credential is unknown or expired.
    async fn resolve(&self, credential: &str) -> Result<Option<OwnerId>, StoreError>;
}

/// Pulls the session credential from `Authorization: Bearer` or the session cookie.
pub fn extract_credential(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let token = value.to_str().ok()?.strip_prefix("Bearer ")?.trim();
        return (!token.is_empty()).then(|| token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// The resolved owner of the current request.
///
/// Extraction fails closed: a missing, unknown or expired credential rejects the
/// request with 401 before any handler code runs.
#[derive(Debug, Clone)]
pub struct AuthenticatedOwner(pub OwnerId);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedOwner {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credential = extract_credential(&parts.headers, &state.session_cookie)
            .ok_or_else(|| AppError::AuthError("Unauthorized".to_string()))?;

        match state.identity.resolve(&credential).await? {
            Some(owner) => {
                tracing::debug!(owner = %owner, "Resolved session");
                Ok(AuthenticatedOwner(owner))
            }
            None => Err(AppError::AuthError("Unauthorized".to_string())),
        }
    }
}
