use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod otp;
pub mod repo;
pub mod repo_types;
pub mod search;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::tree_routes())
}
