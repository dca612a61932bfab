use anyhow::{bail, Context};
use axum::http::HeaderValue;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:5208,http://localhost:5209";

/// Signature algorithm expected on incoming bearer tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtAlgorithm {
    Hs256,
    Rs256,
}

impl std::str::FromStr for JwtAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(Self::Hs256),
            "RS256" => Ok(Self::Rs256),
            other => bail!("unsupported algorithm {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub enabled: bool,
    pub algorithm: JwtAlgorithm,
    pub secret: Option<String>,
    pub public_key_pem: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let db_max_connections = var("DB_MAX_CONNECTIONS")
            .map(|v| v.parse::<u32>().context("DB_MAX_CONNECTIONS must be a positive integer"))
            .transpose()?
            .unwrap_or(10);
        let host = var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = var("APP_PORT")
            .map(|v| v.parse::<u16>().context("APP_PORT must be a port number"))
            .transpose()?
            .unwrap_or(8080);

        let enabled = var("AUTH_ENABLED")
            .map(|v| parse_bool(&v).context("AUTH_ENABLED must be true or false"))
            .transpose()?
            .unwrap_or(true);
        let algorithm = var("AUTH_ALGORITHM")
            .map(|v| v.parse::<JwtAlgorithm>().context("AUTH_ALGORITHM"))
            .transpose()?
            .unwrap_or(JwtAlgorithm::Hs256);
        let auth = AuthConfig {
            enabled,
            algorithm,
            secret: var("AUTH_SECRET"),
            public_key_pem: var("AUTH_PUBLIC_KEY_PEM"),
            issuer: var("AUTH_ISSUER"),
            audience: var("AUTH_AUDIENCE"),
        };
        if auth.enabled {
            match auth.algorithm {
                JwtAlgorithm::Hs256 if auth.secret.is_none() => {
                    bail!("AUTH_SECRET must be set when AUTH_ALGORITHM=HS256")
                }
                JwtAlgorithm::Rs256 if auth.public_key_pem.is_none() => {
                    bail!("AUTH_PUBLIC_KEY_PEM must be set when AUTH_ALGORITHM=RS256")
                }
                _ => {}
            }
        }

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into())
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_owned)
            .collect::<Vec<_>>();
        for origin in &cors_origins {
            HeaderValue::from_str(origin)
                .with_context(|| format!("CORS_ORIGINS contains an invalid origin: {origin}"))?;
        }

        Ok(Self {
            database_url,
            db_max_connections,
            host,
            port,
            auth,
            cors_origins,
        })
    }
}

fn parse_bool(v: &str) -> anyhow::Result<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => bail!("not a boolean: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let cfg = load(&[("DATABASE_URL", "postgres://localhost/cars"), ("AUTH_SECRET", "s")])
            .expect("config loads");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.db_max_connections, 10);
        assert!(cfg.auth.enabled);
        assert_eq!(cfg.auth.algorithm, JwtAlgorithm::Hs256);
        assert_eq!(cfg.cors_origins.len(), 3);
        assert_eq!(cfg.cors_origins[0], "http://localhost:5173");
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = load(&[("AUTH_SECRET", "s")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn hs256_requires_a_secret_unless_auth_is_disabled() {
        let err = load(&[("DATABASE_URL", "postgres://x")]).unwrap_err();
        assert!(err.to_string().contains("AUTH_SECRET"));

        let cfg = load(&[("DATABASE_URL", "postgres://x"), ("AUTH_ENABLED", "false")])
            .expect("disabled auth needs no key");
        assert!(!cfg.auth.enabled);
    }

    #[test]
    fn rs256_requires_a_public_key() {
        let err = load(&[
            ("DATABASE_URL", "postgres://x"),
            ("AUTH_ALGORITHM", "rs256"),
            ("AUTH_SECRET", "ignored"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("AUTH_PUBLIC_KEY_PEM"));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let cfg = load(&[
            ("DATABASE_URL", "postgres://x"),
            ("AUTH_SECRET", "s"),
            ("CORS_ORIGINS", " https://a.example , https://b.example,, "),
        ])
        .expect("config loads");
        assert_eq!(cfg.cors_origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn invalid_port_is_reported() {
        let err = load(&[
            ("DATABASE_URL", "postgres://x"),
            ("AUTH_SECRET", "s"),
            ("APP_PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }
}
