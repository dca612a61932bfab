use anyhow::Context;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::debug;

use super::{
    claims::Claims,
    principal::{Principal, Role},
    verifier::{IdentityVerifier, VerifyError},
};
use crate::config::{AuthConfig, JwtAlgorithm};

/// Widest subject the `car.seller_uid` column stores.
pub const MAX_SUBJECT_LEN: usize = 128;

/// Verification half of the identity provider's signing keys.
#[derive(Clone)]
pub struct JwtKeys {
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub fn from_config(cfg: &AuthConfig) -> anyhow::Result<Self> {
        let (algorithm, decoding) = match cfg.algorithm {
            JwtAlgorithm::Hs256 => {
                let secret = cfg.secret.as_deref().context("AUTH_SECRET is not set")?;
                (Algorithm::HS256, DecodingKey::from_secret(secret.as_bytes()))
            }
            JwtAlgorithm::Rs256 => {
                let pem = cfg
                    .public_key_pem
                    .as_deref()
                    .context("AUTH_PUBLIC_KEY_PEM is not set")?;
                let key = DecodingKey::from_rsa_pem(pem.as_bytes())
                    .context("AUTH_PUBLIC_KEY_PEM is not a valid RSA public key")?;
                (Algorithm::RS256, key)
            }
        };

        let mut validation = Validation::new(algorithm);
        match &cfg.audience {
            Some(aud) => validation.set_audience(std::slice::from_ref(aud)),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &cfg.issuer {
            validation.set_issuer(std::slice::from_ref(iss));
        }

        Ok(Self {
            decoding,
            validation,
        })
    }
}

impl IdentityVerifier for JwtKeys {
    fn verify(&self, token: &str) -> Result<Principal, VerifyError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        let claims = data.claims;
        if claims.sub.trim().is_empty() {
            return Err(VerifyError::MissingSubject);
        }
        if claims.sub.chars().count() > MAX_SUBJECT_LEN {
            return Err(VerifyError::SubjectTooLong);
        }
        let role = Role::from_claim(claims.role_claim().as_deref());
        debug!(uid = %claims.sub, %role, "token verified");
        Ok(Principal::new(claims.sub, role))
    }
}
