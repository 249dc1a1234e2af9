use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::workouts::repo::Workout;

/// Success envelope used by the workout endpoints.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkoutRequest {
    pub exercise_name: String,
    pub duration: i32,
    pub calories: i32,
    pub reps: Option<i32>,
    pub weight: Option<f64>,
    pub notes: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkoutRequest {
    pub exercise_name: Option<String>,
    pub duration: Option<i32>,
    pub calories: Option<i32>,
    pub reps: Option<i32>,
    pub weight: Option<f64>,
    pub notes: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutResponse {
    pub id: Uuid,
    pub exercise_name: String,
    pub duration: i32,
    pub calories: i32,
    pub reps: Option<i32>,
    pub weight: Option<f64>,
    pub notes: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&Workout> for WorkoutResponse {
    fn from(w: &Workout) -> Self {
        Self {
            id: w.id,
            exercise_name: w.exercise_name.clone(),
            duration: w.duration_minutes,
            calories: w.calories,
            reps: w.reps,
            weight: w.weight_kg,
            notes: w.notes.clone(),
            date: w.performed_at,
            created_at: w.created_at,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutStats {
    pub total_workouts: i64,
    pub total_duration: i64,
    pub total_calories: i64,
    pub average_calories: i64,
    pub average_duration: i64,
}

impl WorkoutStats {
    pub fn compute(workouts: &[Workout]) -> Self {
        if workouts.is_empty() {
            return Self {
                total_workouts: 0,
                total_duration: 0,
                total_calories: 0,
                average_calories: 0,
                average_duration: 0,
            };
        }
        let total_workouts = workouts.len() as i64;
        let total_duration: i64 = workouts.iter().map(|w| i64::from(w.duration_minutes)).sum();
        let total_calories: i64 = workouts.iter().map(|w| i64::from(w.calories)).sum();
        Self {
            total_workouts,
            total_duration,
            total_calories,
            average_calories: rounded_div(total_calories, total_workouts),
            average_duration: rounded_div(total_duration, total_workouts),
        }
    }
}

fn rounded_div(sum: i64, count: i64) -> i64 {
    (sum as f64 / count as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workout(duration: i32, calories: i32) -> Workout {
        Workout {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            exercise_name: "Squats".into(),
            duration_minutes: duration,
            calories,
            reps: None,
            weight_kg: None,
            notes: String::new(),
            performed_at: OffsetDateTime::now_utc(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn stats_are_zero_for_no_workouts() {
        let stats = WorkoutStats::compute(&[]);
        assert_eq!(stats.total_workouts, 0);
        assert_eq!(stats.average_calories, 0);
    }

    #[test]
    fn stats_sum_and_round_averages() {
        let stats = WorkoutStats::compute(&[workout(30, 200), workout(45, 301), workout(20, 100)]);
        assert_eq!(stats.total_workouts, 3);
        assert_eq!(stats.total_duration, 95);
        assert_eq!(stats.total_calories, 601);
        // 601 / 3 = 200.33 -> 200, 95 / 3 = 31.67 -> 32
        assert_eq!(stats.average_calories, 200);
        assert_eq!(stats.average_duration, 32);
    }

    #[test]
    fn workout_response_uses_camel_case_fields() {
        let resp = WorkoutResponse::from(&workout(30, 200));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"exerciseName\":\"Squats\""));
        assert!(json.contains("\"createdAt\""));
    }

    #[test]
    fn create_request_requires_core_fields() {
        let ok: CreateWorkoutRequest = serde_json::from_str(
            r#"{"exerciseName":"Bench Press","duration":30,"calories":180,"reps":10}"#,
        )
        .unwrap();
        assert_eq!(ok.exercise_name, "Bench Press");
        assert_eq!(ok.reps, Some(10));

        let missing = serde_json::from_str::<CreateWorkoutRequest>(r#"{"duration":30}"#);
        assert!(missing.is_err());
    }
}
