use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::workouts::dto::{
    CreateWorkoutRequest, Envelope, UpdateWorkoutRequest, WorkoutResponse, WorkoutStats,
};
use crate::workouts::repo::{self, NewWorkout, Workout, WorkoutPatch};

/// Core create fields must be present and positive; zero reads as missing.
fn validate_new_workout(exercise_name: &str, duration: i32, calories: i32) -> Result<(), ApiError> {
    if exercise_name.trim().is_empty() || duration <= 0 || calories <= 0 {
        return Err(ApiError::Validation(
            "exerciseName, duration, and calories are required".into(),
        ));
    }
    Ok(())
}

/// Fetch a workout and enforce that the caller owns it.
async fn load_owned(state: &AppState, id: Uuid, owner: Uuid) -> ApiResult<Workout> {
    let workout = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Workout not found".into()))?;
    if workout.user_id != owner {
        warn!(workout_id = %id, %owner, "workout ownership mismatch");
        return Err(ApiError::Forbidden);
    }
    Ok(workout)
}

#[instrument(skip(state))]
pub async fn list_workouts(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> ApiResult<Json<Envelope<Vec<WorkoutResponse>>>> {
    let workouts = repo::list_by_user(&state.db, claims.sub).await?;
    let data = workouts.iter().map(WorkoutResponse::from).collect();
    Ok(Json(Envelope::ok("Workouts retrieved successfully", data)))
}

#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> ApiResult<Json<Envelope<WorkoutStats>>> {
    let workouts = repo::list_by_user(&state.db, claims.sub).await?;
    let message = if workouts.is_empty() {
        "No workouts found"
    } else {
        "Statistics retrieved successfully"
    };
    Ok(Json(Envelope::ok(message, WorkoutStats::compute(&workouts))))
}

#[instrument(skip(state))]
pub async fn get_workout(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<WorkoutResponse>>> {
    let workout = load_owned(&state, id, claims.sub).await?;
    Ok(Json(Envelope::ok(
        "Workout retrieved successfully",
        WorkoutResponse::from(&workout),
    )))
}

#[instrument(skip(state, payload))]
pub async fn create_workout(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateWorkoutRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<WorkoutResponse>>)> {
    validate_new_workout(&payload.exercise_name, payload.duration, payload.calories)?;

    let workout = repo::create(
        &state.db,
        claims.sub,
        NewWorkout {
            exercise_name: payload.exercise_name.trim(),
            duration_minutes: payload.duration,
            calories: payload.calories,
            reps: payload.reps,
            weight_kg: payload.weight,
            notes: payload.notes.as_deref().unwrap_or(""),
            performed_at: payload.date,
        },
    )
    .await?;

    info!(workout_id = %workout.id, user_id = %claims.sub, "workout created");
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(
            "Workout created successfully",
            WorkoutResponse::from(&workout),
        )),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_workout(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWorkoutRequest>,
) -> ApiResult<Json<Envelope<WorkoutResponse>>> {
    load_owned(&state, id, claims.sub).await?;

    let updated = repo::update(
        &state.db,
        id,
        WorkoutPatch {
            exercise_name: payload.exercise_name.as_deref(),
            duration_minutes: payload.duration,
            calories: payload.calories,
            reps: payload.reps,
            weight_kg: payload.weight,
            notes: payload.notes.as_deref(),
            performed_at: payload.date,
        },
    )
    .await?;

    info!(workout_id = %id, "workout updated");
    Ok(Json(Envelope::ok(
        "Workout updated successfully",
        WorkoutResponse::from(&updated),
    )))
}

#[instrument(skip(state))]
pub async fn delete_workout(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<Option<WorkoutResponse>>>> {
    load_owned(&state, id, claims.sub).await?;
    repo::delete(&state.db, id).await?;

    info!(workout_id = %id, "workout deleted");
    Ok(Json(Envelope::ok("Workout deleted successfully", None)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_validation_accepts_positive_core_fields() {
        assert!(validate_new_workout("Bench Press", 30, 180).is_ok());
    }

    #[test]
    fn create_validation_rejects_missing_or_zero_fields() {
        assert!(validate_new_workout("", 30, 180).is_err());
        assert!(validate_new_workout("   ", 30, 180).is_err());
        assert!(validate_new_workout("Bench Press", 0, 180).is_err());
        assert!(validate_new_workout("Bench Press", -5, 180).is_err());
        assert!(validate_new_workout("Bench Press", 30, 0).is_err());
    }
}
