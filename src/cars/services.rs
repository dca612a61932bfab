use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::{
    dto::{CarDto, CarPayload},
    filter::CarFilter,
    paging::{Page, PageRequest},
    repo::CarRepository,
    repo_types::Car,
    validation::validate,
};
use crate::{auth::Principal, error::AppError};

/// Listing lifecycle and queries. Owns every authorization decision.
#[derive(Clone)]
pub struct CarService {
    repo: Arc<dyn CarRepository>,
}

impl CarService {
    pub fn new(repo: Arc<dyn CarRepository>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &CarFilter,
        page: &PageRequest,
    ) -> Result<Page<CarDto>, AppError> {
        let (rows, total) = self.repo.find_page(filter, page).await?;
        Ok(Page::new(rows, page, total).map(CarDto::from))
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> Result<CarDto, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .map(CarDto::from)
            .ok_or_else(|| not_found(id))
    }

    #[instrument(skip(self, payload), fields(uid = %principal.subject_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        payload: CarPayload,
    ) -> Result<CarDto, AppError> {
        if !principal.can_publish() {
            return Err(AppError::Forbidden("Insufficient role".into()));
        }
        let fields = validate(payload).map_err(AppError::Validation)?;
        let car = self.repo.insert(&fields, &principal.subject_id).await?;
        info!(car_id = car.id, "car created");
        Ok(car.into())
    }

    #[instrument(skip(self, payload), fields(uid = %principal.subject_id))]
    pub async fn update(
        &self,
        principal: &Principal,
        id: i64,
        payload: CarPayload,
    ) -> Result<CarDto, AppError> {
        let fields = validate(payload).map_err(AppError::Validation)?;

        let mut tx = self.repo.begin().await?;
        let car = tx.lock_by_id(id).await?.ok_or_else(|| not_found(id))?;
        ensure_owner_or_admin(principal, &car)?;
        let updated = tx.update(id, &fields).await?;
        tx.commit().await?;

        info!(car_id = id, "car updated");
        Ok(updated.into())
    }

    #[instrument(skip(self), fields(uid = %principal.subject_id))]
    pub async fn delete(&self, principal: &Principal, id: i64) -> Result<(), AppError> {
        let mut tx = self.repo.begin().await?;
        let car = tx.lock_by_id(id).await?.ok_or_else(|| not_found(id))?;
        ensure_owner_or_admin(principal, &car)?;
        tx.delete(id).await?;
        tx.commit().await?;

        info!(car_id = id, "car deleted");
        Ok(())
    }
}

/// ADMIN may touch any listing; anyone else only listings they created.
/// A listing without a seller belongs to nobody.
pub fn ensure_owner_or_admin(principal: &Principal, car: &Car) -> Result<(), AppError> {
    if principal.is_admin() {
        return Ok(());
    }
    match car.seller_uid.as_deref() {
        Some(owner) if owner == principal.subject_id => Ok(()),
        _ => {
            warn!(car_id = car.id, uid = %principal.subject_id, "not owner");
            Err(AppError::Forbidden("Not owner".into()))
        }
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Car {id} not found"))
}
