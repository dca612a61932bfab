use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Request,
    },
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgDatabaseError;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, warn};

/// One failed input constraint, reported back in `details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Uniform error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub status: u16,
    pub path: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    #[error("constraint violation: {0:?}")]
    Constraint(Vec<FieldError>),

    #[error("authentication required")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Constraint(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::Constraint(_) => "ConstraintViolation",
            AppError::Unauthorized => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::NotFound(_) => "NotFound",
            AppError::Internal(_) => "InternalError",
        }
    }

    fn into_body(self) -> ErrorBody {
        let status = self.status().as_u16();
        let error = self.category().to_string();
        let (message, details) = match self {
            AppError::Validation(fields) | AppError::Constraint(fields) => {
                ("Validation failed".to_string(), Some(fields))
            }
            AppError::Unauthorized => ("Authentication required".to_string(), None),
            AppError::Forbidden(msg) | AppError::NotFound(msg) => (msg, None),
            AppError::Internal(err) => {
                error!(error = ?err, "unexpected error");
                ("Unexpected error".to_string(), None)
            }
        };
        ErrorBody {
            error,
            message,
            status,
            path: String::new(),
            timestamp: OffsetDateTime::now_utc(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.into_body();
        let mut res = (status, Json(body.clone())).into_response();
        // picked up by `attach_request_path`
        res.extensions_mut().insert(body);
        res
    }
}

/// Fills `path` on error bodies produced further down the stack.
pub async fn attach_request_path(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    let mut res = next.run(req).await;
    match res.extensions_mut().remove::<ErrorBody>() {
        Some(mut body) => {
            body.path = path;
            (res.status(), Json(body)).into_response()
        }
        None => res,
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match constraint_details(&err) {
            Some(details) => {
                warn!(error = %err, "store rejected write");
                AppError::Constraint(details)
            }
            None => AppError::Internal(err),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(vec![FieldError::new("body", rejection.body_text())])
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(vec![FieldError::new("query", rejection.body_text())])
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(vec![FieldError::new("id", rejection.body_text())])
    }
}

/// Integrity-constraint failures (SQLSTATE class 23) carry the offending
/// constraint or column; anything else is not a constraint violation.
fn constraint_details(err: &anyhow::Error) -> Option<Vec<FieldError>> {
    let db_err = err
        .chain()
        .find_map(|e| e.downcast_ref::<sqlx::Error>())?
        .as_database_error()?;
    if !db_err.code().is_some_and(|code| code.starts_with("23")) {
        return None;
    }
    let field = db_err
        .constraint()
        .map(constraint_field)
        .or_else(|| {
            db_err
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(|pg| pg.column())
                .map(column_field)
        })
        .unwrap_or_else(|| "car".to_string());
    Some(vec![FieldError::new(field, db_err.message())])
}

fn constraint_field(constraint: &str) -> String {
    match constraint {
        "car_year_range" => "year".into(),
        "car_price_non_negative" => "priceEur".into(),
        "car_description_length" => "description".into(),
        other => other.into(),
    }
}

fn column_field(column: &str) -> String {
    match column {
        "price_eur" => "priceEur".into(),
        "image_url" => "imageUrl".into(),
        "seller_uid" => "sellerUid".into(),
        "created_at" => "createdAt".into(),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn body_of(res: Response) -> ErrorBody {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("error body json")
    }

    #[test]
    fn categories_map_to_status_codes() {
        let cases = [
            (AppError::Validation(vec![]), 400, "ValidationError"),
            (AppError::Constraint(vec![]), 400, "ConstraintViolation"),
            (AppError::Unauthorized, 401, "Unauthorized"),
            (AppError::Forbidden("Not owner".into()), 403, "Forbidden"),
            (AppError::NotFound("Car 1 not found".into()), 404, "NotFound"),
            (AppError::Internal(anyhow::anyhow!("boom")), 500, "InternalError"),
        ];
        for (err, status, category) in cases {
            assert_eq!(err.status().as_u16(), status);
            assert_eq!(err.category(), category);
        }
    }

    #[tokio::test]
    async fn internal_error_message_is_not_leaked() {
        let res = AppError::Internal(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(res).await;
        assert_eq!(body.message, "Unexpected error");
        assert!(body.details.is_none());
    }

    #[tokio::test]
    async fn validation_error_lists_details() {
        let res = AppError::Validation(vec![FieldError::new("year", "must be greater than or equal to 1950")])
            .into_response();
        let body = body_of(res).await;
        assert_eq!(body.error, "ValidationError");
        assert_eq!(body.message, "Validation failed");
        assert_eq!(body.status, 400);
        let details = body.details.expect("details present");
        assert_eq!(details[0].field, "year");
    }

    #[test]
    fn details_are_omitted_from_json_when_absent() {
        let body = AppError::NotFound("Car 7 not found".into()).into_body();
        let json = serde_json::to_value(&body).expect("serialize");
        assert!(json.get("details").is_none());
        assert_eq!(json["message"], "Car 7 not found");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn plain_anyhow_errors_stay_internal() {
        let err: AppError = anyhow::anyhow!("pool timed out").into();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn constraint_names_map_to_field_names() {
        assert_eq!(constraint_field("car_year_range"), "year");
        assert_eq!(constraint_field("car_price_non_negative"), "priceEur");
        assert_eq!(constraint_field("some_other"), "some_other");
        assert_eq!(column_field("image_url"), "imageUrl");
    }

    #[tokio::test]
    async fn middleware_fills_the_request_path() {
        let app = Router::new()
            .route(
                "/api/cars/:id",
                get(|| async { AppError::NotFound("Car 9 not found".into()) }),
            )
            .layer(middleware::from_fn(attach_request_path));

        let res = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/cars/9")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body = body_of(res).await;
        assert_eq!(body.path, "/api/cars/9");
        assert_eq!(body.error, "NotFound");
    }
}
