use sqlx::{FromRow, PgPool};
use time::Date;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::profile::dto::UpdateProfileRequest;

#[derive(Debug, Clone, FromRow)]
pub struct WaterRow {
    pub day: Date,
    pub amount_ml: i32,
}

/// Field-wise partial update; absent fields keep their stored value.
pub async fn update_profile(
    db: &PgPool,
    user_id: Uuid,
    update: &UpdateProfileRequest,
) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET height_cm = COALESCE($2, height_cm),
            weight_kg = COALESCE($3, weight_kg),
            age = COALESCE($4, age),
            gender = COALESCE($5, gender),
            water_goal_ml = COALESCE($6, water_goal_ml)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(update.height)
    .bind(update.weight)
    .bind(update.age)
    .bind(update.gender.map(|g| g.as_str()))
    .bind(update.water_goal)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Accumulate today's intake in one upsert and return the new daily total.
/// Same-day concurrent additions serialize on the row, so nothing is lost.
pub async fn add_water(
    db: &PgPool,
    user_id: Uuid,
    day: Date,
    amount_ml: i32,
) -> anyhow::Result<i32> {
    let total: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO water_intake (user_id, day, amount_ml)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, day)
        DO UPDATE SET amount_ml = water_intake.amount_ml + EXCLUDED.amount_ml
        RETURNING amount_ml
        "#,
    )
    .bind(user_id)
    .bind(day)
    .bind(amount_ml)
    .fetch_one(db)
    .await?;
    Ok(total)
}

pub async fn water_on_day(db: &PgPool, user_id: Uuid, day: Date) -> anyhow::Result<Option<i32>> {
    let amount = sqlx::query_scalar(
        "SELECT amount_ml FROM water_intake WHERE user_id = $1 AND day = $2",
    )
    .bind(user_id)
    .bind(day)
    .fetch_optional(db)
    .await?;
    Ok(amount)
}

pub async fn water_since(db: &PgPool, user_id: Uuid, from: Date) -> anyhow::Result<Vec<WaterRow>> {
    let rows = sqlx::query_as::<_, WaterRow>(
        "SELECT day, amount_ml FROM water_intake WHERE user_id = $1 AND day >= $2 ORDER BY day",
    )
    .bind(user_id)
    .bind(from)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
