use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Workout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exercise_name: String,
    pub duration_minutes: i32,
    pub calories: i32,
    pub reps: Option<i32>,
    pub weight_kg: Option<f64>,
    pub notes: String,
    pub performed_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

pub struct NewWorkout<'a> {
    pub exercise_name: &'a str,
    pub duration_minutes: i32,
    pub calories: i32,
    pub reps: Option<i32>,
    pub weight_kg: Option<f64>,
    pub notes: &'a str,
    pub performed_at: Option<OffsetDateTime>,
}

/// Field-wise partial update payload; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct WorkoutPatch<'a> {
    pub exercise_name: Option<&'a str>,
    pub duration_minutes: Option<i32>,
    pub calories: Option<i32>,
    pub reps: Option<i32>,
    pub weight_kg: Option<f64>,
    pub notes: Option<&'a str>,
    pub performed_at: Option<OffsetDateTime>,
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Workout>> {
    let rows = sqlx::query_as::<_, Workout>(
        "SELECT * FROM workouts WHERE user_id = $1 ORDER BY performed_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Workout>> {
    let row = sqlx::query_as::<_, Workout>("SELECT * FROM workouts WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn create(db: &PgPool, user_id: Uuid, new: NewWorkout<'_>) -> anyhow::Result<Workout> {
    let row = sqlx::query_as::<_, Workout>(
        r#"
        INSERT INTO workouts
            (user_id, exercise_name, duration_minutes, calories, reps, weight_kg, notes, performed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, now()))
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(new.exercise_name)
    .bind(new.duration_minutes)
    .bind(new.calories)
    .bind(new.reps)
    .bind(new.weight_kg)
    .bind(new.notes)
    .bind(new.performed_at)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update(db: &PgPool, id: Uuid, patch: WorkoutPatch<'_>) -> anyhow::Result<Workout> {
    let row = sqlx::query_as::<_, Workout>(
        r#"
        UPDATE workouts
        SET exercise_name = COALESCE($2, exercise_name),
            duration_minutes = COALESCE($3, duration_minutes),
            calories = COALESCE($4, calories),
            reps = COALESCE($5, reps),
            weight_kg = COALESCE($6, weight_kg),
            notes = COALESCE($7, notes),
            performed_at = COALESCE($8, performed_at)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(patch.exercise_name)
    .bind(patch.duration_minutes)
    .bind(patch.calories)
    .bind(patch.reps)
    .bind(patch.weight_kg)
    .bind(patch.notes)
    .bind(patch.performed_at)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM workouts WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn recent_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<Workout>> {
    let rows = sqlx::query_as::<_, Workout>(
        "SELECT * FROM workouts WHERE user_id = $1 ORDER BY performed_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
