use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/water", post(handlers::add_water))
        .route("/water/today", get(handlers::water_today))
        .route("/water/history", get(handlers::water_history))
        .route("/bmi", get(handlers::bmi))
}
