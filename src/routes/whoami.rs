use axum::Json;
use serde::Serialize;
use tracing::instrument;

use crate::auth::CurrentUser;

const ANONYMOUS: &str = "anonymousUser";

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub principal: String,
    pub authorities: Vec<String>,
}

/// GET /whoami; reports how the bearer token was understood.
#[instrument(skip_all)]
pub async fn whoami(CurrentUser(user): CurrentUser) -> Json<WhoAmI> {
    let body = match user {
        Some(p) => WhoAmI {
            authorities: vec![p.role.authority()],
            principal: p.subject_id,
        },
        None => WhoAmI {
            principal: ANONYMOUS.into(),
            authorities: Vec::new(),
        },
    };
    Json(body)
}
