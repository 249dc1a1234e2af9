use axum::{extract::State, Json};
use time::{Date, Duration, OffsetDateTime};
use tracing::{info, instrument};

use crate::auth::{extractors::AuthUser, repo::User};
use crate::error::{ApiError, ApiResult};
use crate::profile::dto::{
    AddWaterResponse, BmiResponse, ProfileResponse, UpdateProfileRequest, UpdateProfileResponse,
    WaterHistoryEntry, WaterRequest, WaterTodayResponse,
};
use crate::profile::repo::{self, WaterRow};
use crate::state::AppState;

fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

fn percentage(amount: i32, goal: i32) -> f64 {
    if goal <= 0 {
        return 0.0;
    }
    f64::from(amount) / f64::from(goal) * 100.0
}

/// Both measurements must be present and positive before BMI makes sense.
fn body_metrics(height_cm: Option<f64>, weight_kg: Option<f64>) -> Option<(f64, f64)> {
    match (height_cm, weight_kg) {
        (Some(h), Some(w)) if h > 0.0 && w > 0.0 => Some((h, w)),
        _ => None,
    }
}

fn bmi_value(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);
    (bmi * 10.0).round() / 10.0
}

fn bmi_category(bmi: f64) -> &'static str {
    if bmi < 18.5 {
        "Underweight"
    } else if bmi < 25.0 {
        "Normal weight"
    } else if bmi < 30.0 {
        "Overweight"
    } else {
        "Obese"
    }
}

/// Zero-filled last-7-days view, oldest first, one entry per calendar day.
fn build_history(rows: &[WaterRow], today: Date, goal: i32) -> Vec<WaterHistoryEntry> {
    (0..7)
        .rev()
        .map(|back| {
            let day = today - Duration::days(back);
            let amount = rows
                .iter()
                .find(|r| r.day == day)
                .map(|r| r.amount_ml)
                .unwrap_or(0);
            WaterHistoryEntry {
                date: day.to_string(),
                amount,
                goal,
                percentage: percentage(amount, goal),
            }
        })
        .collect()
}

async fn load_user(state: &AppState, id: uuid::Uuid) -> ApiResult<User> {
    User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> ApiResult<Json<ProfileResponse>> {
    let user = load_user(&state, claims.sub).await?;
    Ok(Json(ProfileResponse::from(&user)))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UpdateProfileResponse>> {
    let user = repo::update_profile(&state.db, claims.sub, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(UpdateProfileResponse {
        message: "Profile updated successfully".into(),
        user: ProfileResponse::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn add_water(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<WaterRequest>,
) -> ApiResult<Json<AddWaterResponse>> {
    if payload.amount <= 0 {
        return Err(ApiError::Validation("Please provide a valid amount".into()));
    }

    let user = load_user(&state, claims.sub).await?;
    let today_total = repo::add_water(&state.db, user.id, today_utc(), payload.amount).await?;

    info!(user_id = %user.id, amount = payload.amount, "water intake recorded");
    Ok(Json(AddWaterResponse {
        message: "Water intake recorded".into(),
        today_intake: today_total,
        goal: user.water_goal_ml,
    }))
}

#[instrument(skip(state))]
pub async fn water_today(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> ApiResult<Json<WaterTodayResponse>> {
    let user = load_user(&state, claims.sub).await?;
    let amount = repo::water_on_day(&state.db, user.id, today_utc())
        .await?
        .unwrap_or(0);

    Ok(Json(WaterTodayResponse {
        today_intake: amount,
        goal: user.water_goal_ml,
        percentage: percentage(amount, user.water_goal_ml),
    }))
}

#[instrument(skip(state))]
pub async fn water_history(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> ApiResult<Json<Vec<WaterHistoryEntry>>> {
    let user = load_user(&state, claims.sub).await?;
    let today = today_utc();
    let rows = repo::water_since(&state.db, user.id, today - Duration::days(6)).await?;
    Ok(Json(build_history(&rows, today, user.water_goal_ml)))
}

#[instrument(skip(state))]
pub async fn bmi(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> ApiResult<Json<BmiResponse>> {
    let user = load_user(&state, claims.sub).await?;

    let (height, weight) =
        body_metrics(user.height_cm, user.weight_kg).ok_or_else(|| {
            ApiError::Validation("Please update your height and weight first".into())
        })?;

    let bmi = bmi_value(height, weight);
    Ok(Json(BmiResponse {
        bmi,
        category: bmi_category(bmi),
        height,
        weight,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn bmi_rounds_to_one_decimal() {
        // 70 kg at 175 cm = 22.857... -> 22.9
        assert_eq!(bmi_value(175.0, 70.0), 22.9);
    }

    #[test]
    fn bmi_categories_at_boundaries() {
        assert_eq!(bmi_category(18.4), "Underweight");
        assert_eq!(bmi_category(18.5), "Normal weight");
        assert_eq!(bmi_category(24.9), "Normal weight");
        assert_eq!(bmi_category(25.0), "Overweight");
        assert_eq!(bmi_category(30.0), "Obese");
    }

    #[test]
    fn body_metrics_require_positive_height_and_weight() {
        assert_eq!(body_metrics(Some(175.0), Some(70.0)), Some((175.0, 70.0)));
        assert_eq!(body_metrics(None, Some(70.0)), None);
        assert_eq!(body_metrics(Some(175.0), None), None);
        assert_eq!(body_metrics(Some(0.0), Some(70.0)), None);
        assert_eq!(body_metrics(Some(175.0), Some(0.0)), None);
        assert_eq!(body_metrics(Some(175.0), Some(-5.0)), None);
    }

    #[test]
    fn percentage_handles_zero_goal() {
        assert_eq!(percentage(500, 0), 0.0);
        assert_eq!(percentage(500, 2000), 25.0);
    }

    #[test]
    fn history_zero_fills_missing_days_oldest_first() {
        let today = date!(2026 - 08 - 30);
        let rows = vec![
            WaterRow {
                day: date!(2026 - 08 - 28),
                amount_ml: 600,
            },
            WaterRow {
                day: date!(2026 - 08 - 30),
                amount_ml: 300,
            },
        ];
        let history = build_history(&rows, today, 2000);
        assert_eq!(history.len(), 7);
        assert_eq!(history[0].date, "2026-08-24");
        assert_eq!(history[0].amount, 0);
        assert_eq!(history[4].date, "2026-08-28");
        assert_eq!(history[4].amount, 600);
        assert_eq!(history[4].percentage, 30.0);
        assert_eq!(history[6].date, "2026-08-30");
        assert_eq!(history[6].amount, 300);
    }
}
