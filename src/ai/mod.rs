use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod client;
pub mod handlers;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/workout", post(handlers::generate_workout_plan))
        .route("/status", get(handlers::status))
}
