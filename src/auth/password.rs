use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

pub const STRENGTH_POLICY_MESSAGE: &str =
    "Password must be at least 8 characters and include uppercase, lowercase, number, and special character";

/// >=8 chars with at least one uppercase, lowercase, digit and symbol.
pub fn meets_strength_policy(password: &str) -> bool {
    password.len() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_alphanumeric())
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "Correct-Horse-Battery-1";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("Wrong-Password-2", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn strength_policy_accepts_compliant_password() {
        assert!(meets_strength_policy("Abcdef1!"));
    }

    #[test]
    fn strength_policy_rejects_weak_passwords() {
        assert!(!meets_strength_policy("Ab1!"));          // too short
        assert!(!meets_strength_policy("abcdefg1!"));     // no uppercase
        assert!(!meets_strength_policy("ABCDEFG1!"));     // no lowercase
        assert!(!meets_strength_policy("Abcdefgh!"));     // no digit
        assert!(!meets_strength_policy("Abcdefg12"));     // no symbol
        assert!(!meets_strength_policy(""));
    }
}
