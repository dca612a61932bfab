use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, warn};

use super::principal::Principal;
use crate::{error::AppError, state::AppState};

/// Caller identity; `None` for anonymous requests.
///
/// A missing, malformed or unverifiable bearer token never rejects the
/// request, it only leaves the caller anonymous.
pub struct CurrentUser(pub Option<Principal>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(CurrentUser(None));
        };
        match state.verifier.verify(token) {
            Ok(principal) => Ok(CurrentUser(Some(principal))),
            Err(e) => {
                warn!(error = %e, "bearer token rejected; continuing anonymously");
                Ok(CurrentUser(None))
            }
        }
    }
}

/// Route gate for listing writes: authenticated with role SELLER or ADMIN.
pub struct SellerOrAdmin(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for SellerOrAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(principal) = match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => user,
            Err(never) => match never {},
        };
        let principal = principal.ok_or(AppError::Unauthorized)?;
        if !principal.can_publish() {
            debug!(uid = %principal.subject_id, role = %principal.role, "role not allowed to write");
            return Err(AppError::Forbidden("Insufficient role".into()));
        }
        Ok(SellerOrAdmin(principal))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}
