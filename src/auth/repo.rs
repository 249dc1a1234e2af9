use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::otp::{RESEND_COOLDOWN, RESEND_HOURLY_CAP, RESEND_WINDOW};

/// User record in the database. Secret fields never reach clients; responses
/// go through the DTO types instead.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_verified: bool,
    #[serde(skip_serializing)]
    pub otp_hash: Option<String>,
    #[serde(skip_serializing)]
    pub otp_expires_at: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub otp_request_times: Vec<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub password_reset_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_token_expires_at: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub password_reset_otp_hash: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_otp_expires_at: Option<OffsetDateTime>,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub streak_points: i32,
    pub last_workout_date: Option<OffsetDateTime>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub water_goal_ml: i32,
    pub created_at: OffsetDateTime,
}

impl User {
    /// Find a user by email. Callers lowercase the email first.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Create an unverified user with a pending signup OTP. Returns `None`
    /// when the email is already taken, including when a concurrent signup
    /// slipped in between the caller's existence check and this insert.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        otp_hash: &str,
        otp_expires_at: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, otp_hash, otp_expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(otp_hash)
        .bind(otp_expires_at)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Flip the verified flag and clear the signup/login OTP pair.
    pub async fn mark_verified_clear_otp(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET is_verified = TRUE, otp_hash = NULL, otp_expires_at = NULL WHERE id = $1",
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Store a fresh signup/login OTP and record the request instant, but only
    /// if the rate limit allows it. The cooldown check, hourly-cap check,
    /// window prune and timestamp append all happen in one conditional UPDATE,
    /// so two concurrent resends for the same user serialize on the row lock
    /// and at most one wins.
    ///
    /// Returns false when the update did not apply (rate limited).
    pub async fn try_issue_resend_otp(
        db: &PgPool,
        id: Uuid,
        otp_hash: &str,
        otp_expires_at: OffsetDateTime,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let window_start = now - RESEND_WINDOW;
        let cooldown_start = now - RESEND_COOLDOWN;
        let row = sqlx::query(
            r#"
            UPDATE users
            SET otp_hash = $2,
                otp_expires_at = $3,
                otp_request_times = ARRAY(
                    SELECT t FROM unnest(otp_request_times) AS t WHERE t > $4
                ) || $5::timestamptz
            WHERE id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM unnest(otp_request_times) AS t WHERE t > $6
              )
              AND (
                  SELECT count(*) FROM unnest(otp_request_times) AS t WHERE t > $4
              ) < $7
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(otp_hash)
        .bind(otp_expires_at)
        .bind(window_start)
        .bind(now)
        .bind(cooldown_start)
        .bind(RESEND_HOURLY_CAP as i64)
        .fetch_optional(db)
        .await?;
        Ok(row.is_some())
    }

    /// Store a password-reset OTP; independent of the signup/login OTP fields.
    pub async fn set_reset_otp(
        db: &PgPool,
        id: Uuid,
        otp_hash: &str,
        otp_expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET password_reset_otp_hash = $2, password_reset_otp_expires_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(otp_hash)
        .bind(otp_expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Set the new password hash and clear every reset credential, token and
    /// OTP alike, regardless of which path was verified.
    pub async fn update_password_clear_reset(
        db: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_reset_token_hash = NULL,
                password_reset_token_expires_at = NULL,
                password_reset_otp_hash = NULL,
                password_reset_otp_expires_at = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(())
    }
}
