use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::{jwt::JwtKeys, principal::Principal};
use crate::config::AuthConfig;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("authentication is disabled")]
    Disabled,
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token has no subject")]
    MissingSubject,
    #[error("token subject is too long")]
    SubjectTooLong,
}

/// Turns a bearer token into a principal.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Principal, VerifyError>;
}

/// Used when authentication is switched off: nobody is ever authenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledVerifier;

impl IdentityVerifier for DisabledVerifier {
    fn verify(&self, _token: &str) -> Result<Principal, VerifyError> {
        Err(VerifyError::Disabled)
    }
}

pub fn from_config(cfg: &AuthConfig) -> anyhow::Result<Arc<dyn IdentityVerifier>> {
    if !cfg.enabled {
        info!("authentication disabled; all requests are anonymous");
        return Ok(Arc::new(DisabledVerifier));
    }
    Ok(Arc::new(JwtKeys::from_config(cfg)?))
}
