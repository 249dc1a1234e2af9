use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use tracing::{error, instrument};

use crate::ai::client::AiClientError;
use crate::auth::{extractors::AuthUser, repo::User};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::workouts::repo::{self, Workout};

const SYSTEM_PROMPT: &str = "You are a concise, efficiency-focused AI personal trainer. \
Answer only fitness, workout, nutrition and general physical-health questions; for anything else reply \
\"I'm sorry, I can only assist with fitness and workout-related queries.\" \
When the user asks for a workout, output only the exercises, reps and safety notes as a bullet or numbered list, \
no conversational filler, under 300 words. Respect any stated injuries, time limits and available equipment, \
and tailor the plan to the user's profile, goals and recent workouts.";

#[derive(Debug, Deserialize)]
pub struct WorkoutPromptRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct WorkoutPlanResponse {
    pub assistant: String,
    pub raw: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiStatusResponse {
    pub provider: &'static str,
    pub configured: bool,
    pub model: String,
    pub api_url: Option<String>,
    pub message: String,
}

/// Profile and recent-workout context embedded in the user message.
pub(crate) fn profile_context(user: &User) -> Value {
    json!({
        "id": user.id,
        "name": user.name,
        "age": user.age,
        "gender": user.gender,
        "height_cm": user.height_cm,
        "weight_kg": user.weight_kg,
        "currentStreak": user.current_streak,
        "longestStreak": user.longest_streak,
        "streakPoints": user.streak_points,
        "lastWorkoutDate": user.last_workout_date.and_then(|d| d.format(&Rfc3339).ok()),
        "waterGoal": user.water_goal_ml,
    })
}

pub(crate) fn workout_context(workouts: &[Workout]) -> Value {
    let items: Vec<Value> = workouts
        .iter()
        .map(|w| {
            json!({
                "date": w.performed_at.date().to_string(),
                "exerciseName": w.exercise_name,
                "duration": w.duration_minutes,
                "calories": w.calories,
                "notes": w.notes,
            })
        })
        .collect();
    Value::Array(items)
}

pub(crate) fn build_user_message(user: &User, recent: &[Workout], prompt: &str) -> String {
    format!(
        "User profile: {}\nRecent workouts (up to 7): {}\nUser request: {}",
        profile_context(user),
        workout_context(recent),
        prompt
    )
}

#[instrument(skip(state, payload))]
pub async fn generate_workout_plan(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<WorkoutPromptRequest>,
) -> ApiResult<Json<WorkoutPlanResponse>> {
    let prompt = payload.prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::Validation(
            "Please provide a prompt in the request body, e.g. { \"prompt\": \"I have back pain and 20 minutes, give me a workout\" }".into(),
        ));
    }

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    let recent = repo::recent_by_user(&state.db, user.id, 7).await?;

    let user_message = build_user_message(&user, &recent, prompt);
    let reply = state
        .ai
        .generate(SYSTEM_PROMPT, &user_message)
        .await
        .map_err(|e| match e {
            AiClientError::NotConfigured => ApiError::Misconfigured(e.to_string()),
            AiClientError::Provider { status, ref body } => {
                error!(%status, %body, "gemini provider error");
                ApiError::Upstream(format!("AI provider error ({status})"))
            }
            AiClientError::Transport(ref err) => {
                error!(error = %err, "gemini request failed");
                ApiError::Upstream("AI provider unreachable".into())
            }
        })?;

    Ok(Json(WorkoutPlanResponse {
        assistant: reply.text,
        raw: reply.raw,
    }))
}

#[instrument(skip(state))]
pub async fn status(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
) -> Json<AiStatusResponse> {
    let config = state.ai.config();
    let configured = config.is_configured();
    let message = if configured {
        "Gemini provider appears configured.".into()
    } else {
        "Gemini provider is not configured. Set GEMINI_API_KEY and GEMINI_API_URL.".into()
    };
    Json(AiStatusResponse {
        provider: "gemini",
        configured,
        model: config.model.clone(),
        api_url: config.api_url.clone(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "A".into(),
            email: "a@x.com".into(),
            password_hash: "hash".into(),
            is_verified: true,
            otp_hash: None,
            otp_expires_at: None,
            otp_request_times: vec![],
            password_reset_token_hash: None,
            password_reset_token_expires_at: None,
            password_reset_otp_hash: None,
            password_reset_otp_expires_at: None,
            current_streak: 3,
            longest_streak: 5,
            streak_points: 30,
            last_workout_date: None,
            height_cm: Some(175.0),
            weight_kg: Some(70.0),
            age: Some(30),
            gender: Some("male".into()),
            water_goal_ml: 2000,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn profile_context_never_contains_secrets() {
        let ctx = profile_context(&test_user());
        let text = ctx.to_string();
        assert!(!text.contains("hash"));
        assert!(text.contains("\"currentStreak\":3"));
        assert!(text.contains("\"height_cm\":175.0"));
    }

    #[test]
    fn user_message_embeds_profile_workouts_and_prompt() {
        let user = test_user();
        let msg = build_user_message(&user, &[], "20 minute leg day");
        assert!(msg.starts_with("User profile: "));
        assert!(msg.contains("Recent workouts (up to 7): []"));
        assert!(msg.ends_with("User request: 20 minute leg day"));
    }
}
