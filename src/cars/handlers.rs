use axum::{
    extract::State,
    http::{header::LOCATION, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CarDto, CarPayload, ListParams},
    filter::CarFilter,
    paging::{Page, PageRequest},
};
use crate::{
    auth::SellerOrAdmin,
    error::AppError,
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cars", get(list_cars).post(create_car))
        .route(
            "/cars/:id",
            get(get_car).put(update_car).delete(delete_car),
        )
}

/// GET /cars?make=&yearFrom=&yearTo=&priceFrom=&priceTo=&page=&size=&sort=
#[instrument(skip(state))]
pub async fn list_cars(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Page<CarDto>>, AppError> {
    let filter = CarFilter::from_params(&params);
    let page = PageRequest::from_params(&params).map_err(|e| AppError::Validation(vec![e]))?;
    Ok(Json(state.cars.list(&filter, &page).await?))
}

#[instrument(skip(state))]
pub async fn get_car(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<CarDto>, AppError> {
    Ok(Json(state.cars.get_by_id(id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_car(
    State(state): State<AppState>,
    SellerOrAdmin(principal): SellerOrAdmin,
    AppJson(payload): AppJson<CarPayload>,
) -> Result<impl IntoResponse, AppError> {
    let car = state.cars.create(&principal, payload).await?;
    let location = format!("/api/cars/{}", car.id);
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(car)))
}

#[instrument(skip(state, payload))]
pub async fn update_car(
    State(state): State<AppState>,
    SellerOrAdmin(principal): SellerOrAdmin,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<CarPayload>,
) -> Result<Json<CarDto>, AppError> {
    Ok(Json(state.cars.update(&principal, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_car(
    State(state): State<AppState>,
    SellerOrAdmin(principal): SellerOrAdmin,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    state.cars.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
