use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::User;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendOtpRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpLoginRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub token: Option<String>,
    pub otp: Option<String>,
    pub password: String,
}

/// Which reset credential the caller supplied. Dispatch is explicit rather
/// than inferred from whichever optional field happens to be set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetCredential {
    Token(String),
    Otp(String),
}

impl ResetPasswordRequest {
    pub fn credential(&self) -> Result<ResetCredential, ApiError> {
        match (&self.token, &self.otp) {
            (Some(token), None) => Ok(ResetCredential::Token(token.clone())),
            (None, Some(otp)) => Ok(ResetCredential::Otp(otp.clone())),
            _ => Err(ApiError::Validation(
                "Email, token/otp and password are required".into(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub email: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_verified: bool,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_verified: user.is_verified,
        }
    }
}

/// Response returned after verify-otp, login or login-otp.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(token: Option<&str>, otp: Option<&str>) -> ResetPasswordRequest {
        ResetPasswordRequest {
            email: "a@x.com".into(),
            token: token.map(String::from),
            otp: otp.map(String::from),
            password: "Abcdef1!".into(),
        }
    }

    #[test]
    fn credential_dispatches_token_and_otp() {
        assert_eq!(
            request(Some("tok"), None).credential().unwrap(),
            ResetCredential::Token("tok".into())
        );
        assert_eq!(
            request(None, Some("123456")).credential().unwrap(),
            ResetCredential::Otp("123456".into())
        );
    }

    #[test]
    fn credential_rejects_none_and_both() {
        assert!(request(None, None).credential().is_err());
        assert!(request(Some("tok"), Some("123456")).credential().is_err());
    }

    #[test]
    fn public_user_serializes_camel_case() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            name: "A".into(),
            email: "a@x.com".into(),
            is_verified: true,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("\"isVerified\":true"));
        assert!(json.contains("a@x.com"));
    }
}
