use std::sync::Arc;

use crate::{
    auth::{verifier, IdentityVerifier},
    cars::{CarService, PgCarRepository},
    config::AppConfig,
    db,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub cars: CarService,
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let verifier = verifier::from_config(&config.auth)?;

        let pool = db::connect(&config).await?;
        db::migrate(&pool).await;

        let repo = Arc::new(PgCarRepository::new(pool));
        Ok(Self {
            config: Arc::new(config),
            cars: CarService::new(repo),
            verifier,
        })
    }

    /// In-memory store and an HS256 verifier keyed with the test secret.
    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(crate::cars::memory::InMemoryCarRepository::new())
    }

    #[cfg(test)]
    pub fn fake_with(repo: crate::cars::memory::InMemoryCarRepository) -> Self {
        let config = crate::test_support::config();
        let verifier = verifier::from_config(&config.auth).expect("test verifier");
        Self {
            config: Arc::new(config),
            cars: CarService::new(Arc::new(repo)),
            verifier,
        }
    }
}
