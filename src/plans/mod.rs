pub mod assembler;
pub mod candidates;
pub mod composer;
mod dto;
pub mod handlers;
pub mod model;
pub mod repo;
pub mod service;

use crate::state::AppState;
use axum::Router;

pub use service::DietPlanService;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::plan_routes())
}
