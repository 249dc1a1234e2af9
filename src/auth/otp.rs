use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::{rngs::OsRng, Rng};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

pub const OTP_TTL: Duration = Duration::minutes(5);

pub const RESEND_COOLDOWN: Duration = Duration::seconds(60);
pub const RESEND_WINDOW: Duration = Duration::hours(1);
pub const RESEND_HOURLY_CAP: usize = 5;

/// A freshly issued OTP: the plaintext code goes out by email, only the hash
/// and expiry are persisted.
pub struct IssuedOtp {
    pub code: String,
    pub hash: String,
    pub expires_at: OffsetDateTime,
}

pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

pub fn issue(now: OffsetDateTime) -> anyhow::Result<IssuedOtp> {
    let code = generate_code();
    let hash = hash_code(&code)?;
    Ok(IssuedOtp {
        code,
        hash,
        expires_at: now + OTP_TTL,
    })
}

// Codes live five minutes, so the hash gets a cheaper cost than account
// passwords (4 MiB, 2 passes).
fn otp_hasher() -> anyhow::Result<Argon2<'static>> {
    let params =
        Params::new(4096, 2, 1, None).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

pub fn hash_code(code: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = otp_hasher()?
        .hash_password(code.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();
    Ok(hash)
}

pub fn verify_code(code: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(code.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Digest for the legacy link-flow reset token. The token itself is
/// high-entropy and single-use, so a plain SHA-256 is enough; only digests
/// issued by the previous system live in storage.
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendVerdict {
    Allowed,
    Cooldown,
    CapReached,
}

/// Rate-limit verdict over the trailing-hour request timestamps. The store
/// enforces this atomically; this function exists to pick the right refusal
/// message and for early rejection before hashing a new code.
pub fn resend_verdict(requests: &[OffsetDateTime], now: OffsetDateTime) -> ResendVerdict {
    let window_start = now - RESEND_WINDOW;
    let recent: Vec<&OffsetDateTime> = requests.iter().filter(|t| **t > window_start).collect();

    if let Some(last) = recent.iter().copied().max() {
        if now - *last < RESEND_COOLDOWN {
            return ResendVerdict::Cooldown;
        }
    }
    if recent.len() >= RESEND_HOURLY_CAP {
        return ResendVerdict::CapReached;
    }
    ResendVerdict::Allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn generated_code_is_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().expect("numeric");
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn issued_otp_verifies_and_expires_in_five_minutes() {
        let now = OffsetDateTime::now_utc();
        let issued = issue(now).expect("issue otp");
        assert!(verify_code(&issued.code, &issued.hash));
        assert!(!verify_code("000000", &issued.hash));
        assert_eq!(issued.expires_at - now, OTP_TTL);
    }

    #[test]
    fn verify_code_rejects_malformed_hash() {
        assert!(!verify_code("123456", "garbage"));
    }

    #[test]
    fn reset_token_digest_is_deterministic() {
        let digest = hash_reset_token("legacy-token");
        assert_eq!(digest.len(), 64);
        assert_eq!(hash_reset_token("legacy-token"), digest);
        assert_ne!(hash_reset_token("other-token"), digest);
    }

    #[test]
    fn resend_allowed_with_no_history() {
        let now = datetime!(2026-08-30 12:00 UTC);
        assert_eq!(resend_verdict(&[], now), ResendVerdict::Allowed);
    }

    #[test]
    fn resend_blocked_within_cooldown() {
        let now = datetime!(2026-08-30 12:00 UTC);
        let requests = [now - Duration::seconds(30)];
        assert_eq!(resend_verdict(&requests, now), ResendVerdict::Cooldown);
    }

    #[test]
    fn resend_allowed_after_cooldown() {
        let now = datetime!(2026-08-30 12:00 UTC);
        let requests = [now - Duration::seconds(61)];
        assert_eq!(resend_verdict(&requests, now), ResendVerdict::Allowed);
    }

    #[test]
    fn resend_blocked_at_hourly_cap() {
        let now = datetime!(2026-08-30 12:00 UTC);
        let requests: Vec<_> = (0..5)
            .map(|i| now - Duration::minutes(10 * (i + 1)))
            .collect();
        assert_eq!(resend_verdict(&requests, now), ResendVerdict::CapReached);
    }

    #[test]
    fn resend_allowed_once_oldest_request_ages_out() {
        let now = datetime!(2026-08-30 12:00 UTC);
        // Five requests, but one is older than the trailing hour.
        let mut requests: Vec<_> = (0..4)
            .map(|i| now - Duration::minutes(10 * (i + 1)))
            .collect();
        requests.push(now - Duration::minutes(61));
        assert_eq!(resend_verdict(&requests, now), ResendVerdict::Allowed);
    }
}
