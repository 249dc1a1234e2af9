use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

/// User record without credential or OTP material.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_verified: bool,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub water_goal: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub streak_points: i32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_workout_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_verified: user.is_verified,
            height: user.height_cm,
            weight: user.weight_kg,
            age: user.age,
            gender: user.gender.clone(),
            water_goal: user.water_goal_ml,
            current_streak: user.current_streak,
            longest_streak: user.longest_streak,
            streak_points: user.streak_points,
            last_workout_date: user.last_workout_date,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub water_goal: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub message: String,
    pub user: ProfileResponse,
}

#[derive(Debug, Deserialize)]
pub struct WaterRequest {
    pub amount: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWaterResponse {
    pub message: String,
    pub today_intake: i32,
    pub goal: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterTodayResponse {
    pub today_intake: i32,
    pub goal: i32,
    pub percentage: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WaterHistoryEntry {
    pub date: String,
    pub amount: i32,
    pub goal: i32,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct BmiResponse {
    pub bmi: f64,
    pub category: &'static str,
    pub height: f64,
    pub weight: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_parses_lowercase() {
        let g: Gender = serde_json::from_str("\"female\"").unwrap();
        assert_eq!(g, Gender::Female);
        assert_eq!(g.as_str(), "female");
        assert!(serde_json::from_str::<Gender>("\"unknown\"").is_err());
    }

    #[test]
    fn update_request_accepts_partial_camel_case_body() {
        let req: UpdateProfileRequest =
            serde_json::from_str(r#"{"height": 180.0, "waterGoal": 2500}"#).unwrap();
        assert_eq!(req.height, Some(180.0));
        assert_eq!(req.water_goal, Some(2500));
        assert!(req.weight.is_none());
        assert!(req.gender.is_none());
    }
}
