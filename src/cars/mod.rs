pub mod dto;
pub mod filter;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod paging;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod validation;

use crate::state::AppState;
use axum::Router;

pub use repo::PgCarRepository;
pub use services::CarService;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
