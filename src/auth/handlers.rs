use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::auth::{
    dto::{
        AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, OtpLoginRequest,
        PublicUser, ResendOtpRequest, ResetCredential, ResetPasswordRequest, SignupRequest,
        SignupResponse, VerifyOtpRequest,
    },
    jwt::JwtKeys,
    otp::{self, ResendVerdict},
    password::{self, STRENGTH_POLICY_MESSAGE},
    repo::User,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    let email = normalize_email(&payload.email);

    if payload.name.trim().is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Missing required fields: name, email, password".into(),
        ));
    }
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if !password::meets_strength_policy(&payload.password) {
        warn!("password fails strength policy");
        return Err(ApiError::Validation(STRENGTH_POLICY_MESSAGE.into()));
    }

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let password_hash = password::hash_password(&payload.password)?;
    let issued = otp::issue(OffsetDateTime::now_utc())?;

    // The earlier lookup is only a fast path; a concurrent signup can still
    // land first, in which case the insert yields no row.
    let Some(user) = User::create(
        &state.db,
        payload.name.trim(),
        &email,
        &password_hash,
        &issued.hash,
        issued.expires_at,
    )
    .await?
    else {
        warn!(%email, "email registered concurrently");
        return Err(ApiError::Conflict("Email already registered".into()));
    };

    // Delivery failure never rolls back user creation; the code can be resent.
    if let Err(e) = state.mailer.send_otp(&user.email, &issued.code).await {
        error!(error = %e, email = %user.email, "signup OTP email failed, user was created");
    }

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Registration successful! OTP sent to your email. Please verify within 5 minutes.".into(),
            email: user.email,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.otp.is_empty() {
        return Err(ApiError::Validation(
            "Missing required fields: email, otp".into(),
        ));
    }

    // 400 rather than 404 so the endpoint leaks nothing extra about accounts.
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::Validation("User not found".into()))?;

    if user.is_verified {
        return Err(ApiError::Conflict("User already verified".into()));
    }

    let (otp_hash, otp_expires_at) = match (&user.otp_hash, user.otp_expires_at) {
        (Some(hash), Some(expires)) => (hash, expires),
        _ => {
            return Err(ApiError::InvalidState(
                "No OTP found. Please signup again or request OTP resend.".into(),
            ))
        }
    };

    if otp_expires_at < OffsetDateTime::now_utc() {
        return Err(ApiError::Expired(
            "OTP expired. Please request a new one.".into(),
        ));
    }
    if !otp::verify_code(&payload.otp, otp_hash) {
        warn!(user_id = %user.id, "otp mismatch");
        return Err(ApiError::InvalidCredential("Invalid OTP".into()));
    }

    User::mark_verified_clear_otp(&state.db, user.id).await?;

    let token = JwtKeys::from_ref(&state).sign(&user)?;
    info!(user_id = %user.id, "email verified");

    let mut public = PublicUser::from(&user);
    public.is_verified = true;
    Ok(Json(AuthResponse {
        message: "Email verified successfully!".into(),
        token,
        user: public,
    }))
}

#[instrument(skip(state, payload))]
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(payload): Json<ResendOtpRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let email = normalize_email(&payload.email);
    if email.is_empty() {
        return Err(ApiError::Validation("Email is required".into()));
    }

    // Generic response for unknown emails, no account enumeration.
    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        return Ok(Json(MessageResponse::new(
            "If email exists and is unverified, OTP will be resent.",
        )));
    };

    let now = OffsetDateTime::now_utc();
    match otp::resend_verdict(&user.otp_request_times, now) {
        ResendVerdict::Cooldown => {
            return Err(ApiError::RateLimit(
                "Please wait before requesting another OTP".into(),
            ))
        }
        ResendVerdict::CapReached => {
            return Err(ApiError::RateLimit(
                "OTP resend limit reached. Try again later.".into(),
            ))
        }
        ResendVerdict::Allowed => {}
    }

    let issued = otp::issue(now)?;
    let applied =
        User::try_issue_resend_otp(&state.db, user.id, &issued.hash, issued.expires_at, now)
            .await?;
    if !applied {
        // Lost a race with a concurrent resend that passed the check first.
        return Err(ApiError::RateLimit(
            "Please wait before requesting another OTP".into(),
        ));
    }

    if let Err(e) = state.mailer.send_otp(&user.email, &issued.code).await {
        error!(error = %e, email = %user.email, "OTP resend email failed");
        return Err(ApiError::EmailDelivery("Failed to send OTP email".into()));
    }

    info!(user_id = %user.id, "otp resent");
    Ok(Json(MessageResponse::new("OTP resent to email")))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".into(),
        ));
    }

    // Unknown email and wrong password produce identical responses.
    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(%email, "login unknown email");
        return Err(ApiError::InvalidCredential("Invalid credentials".into()));
    };

    if !user.is_verified {
        return Err(ApiError::NotVerified);
    }

    if !password::verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredential("Invalid credentials".into()));
    }

    let token = JwtKeys::from_ref(&state).sign(&user)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login_otp(
    State(state): State<AppState>,
    Json(payload): Json<OtpLoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.otp.is_empty() {
        return Err(ApiError::Validation("Email and otp are required".into()));
    }

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        return Err(ApiError::InvalidCredential("Invalid credentials".into()));
    };

    let (otp_hash, otp_expires_at) = match (&user.otp_hash, user.otp_expires_at) {
        (Some(hash), Some(expires)) => (hash, expires),
        _ => {
            return Err(ApiError::InvalidState(
                "No OTP found. Please request OTP resend.".into(),
            ))
        }
    };

    if otp_expires_at < OffsetDateTime::now_utc() {
        return Err(ApiError::Expired(
            "OTP expired. Please request a new one.".into(),
        ));
    }
    if !otp::verify_code(&payload.otp, otp_hash) {
        warn!(user_id = %user.id, "otp login mismatch");
        return Err(ApiError::InvalidCredential("Invalid OTP".into()));
    }

    // A correct OTP proves email ownership, so this also verifies the account.
    User::mark_verified_clear_otp(&state.db, user.id).await?;

    let token = JwtKeys::from_ref(&state).sign(&user)?;
    info!(user_id = %user.id, "user logged in via otp");

    let mut public = PublicUser::from(&user);
    public.is_verified = true;
    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        token,
        user: public,
    }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let email = normalize_email(&payload.email);
    if email.is_empty() {
        return Err(ApiError::Validation("Email is required".into()));
    }

    const GENERIC: &str = "If that email exists, an OTP was sent.";

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        return Ok(Json(MessageResponse::new(GENERIC)));
    };

    let issued = otp::issue(OffsetDateTime::now_utc())?;
    User::set_reset_otp(&state.db, user.id, &issued.hash, issued.expires_at).await?;

    // Unlike signup, a failed reset email surfaces to the caller: there is no
    // other way for the user to complete this flow.
    if let Err(e) = state.mailer.send_otp(&user.email, &issued.code).await {
        error!(error = %e, email = %user.email, "forgot-password OTP email failed");
        return Err(ApiError::EmailDelivery("Failed to send reset OTP".into()));
    }

    info!(user_id = %user.id, "password reset otp issued");
    Ok(Json(MessageResponse::new(GENERIC)))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Email, token/otp and password are required".into(),
        ));
    }
    let credential = payload.credential()?;

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::Validation("Invalid or expired token/OTP".into()))?;

    let now = OffsetDateTime::now_utc();
    match credential {
        ResetCredential::Token(token) => {
            let (stored, expires) = match (
                &user.password_reset_token_hash,
                user.password_reset_token_expires_at,
            ) {
                (Some(h), Some(e)) => (h, e),
                _ => return Err(ApiError::InvalidState("Invalid or expired token".into())),
            };
            if expires < now {
                return Err(ApiError::Expired("Reset token expired".into()));
            }
            if otp::hash_reset_token(&token) != *stored {
                warn!(user_id = %user.id, "reset token mismatch");
                return Err(ApiError::InvalidCredential("Invalid token".into()));
            }
        }
        ResetCredential::Otp(code) => {
            let (stored, expires) = match (
                &user.password_reset_otp_hash,
                user.password_reset_otp_expires_at,
            ) {
                (Some(h), Some(e)) => (h, e),
                _ => return Err(ApiError::InvalidState("Invalid or expired OTP".into())),
            };
            if expires < now {
                return Err(ApiError::Expired("OTP expired".into()));
            }
            if !otp::verify_code(&code, stored) {
                warn!(user_id = %user.id, "reset otp mismatch");
                return Err(ApiError::InvalidCredential("Invalid OTP".into()));
            }
        }
    }

    if !password::meets_strength_policy(&payload.password) {
        return Err(ApiError::Validation(STRENGTH_POLICY_MESSAGE.into()));
    }

    let password_hash = password::hash_password(&payload.password)?;
    User::update_password_clear_reset(&state.db, user.id, &password_hash).await?;

    info!(user_id = %user.id, "password reset");
    Ok(Json(MessageResponse::new("Password reset successful")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@x.com"));
    }

    #[test]
    fn email_normalization_trims_and_lowercases() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }
}
