use axum::{routing::get, Router};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_workouts).post(handlers::create_workout))
        .route("/stats", get(handlers::get_stats))
        .route(
            "/:id",
            get(handlers::get_workout)
                .put(handlers::update_workout)
                .delete(handlers::delete_workout),
        )
}
