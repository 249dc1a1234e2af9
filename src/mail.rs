use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::MailConfig;

/// Outbound email seam. Handlers only ever see this trait, so tests and
/// unconfigured dev environments can swap in a no-op implementation.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp(&self, to: &str, code: &str) -> anyhow::Result<()>;
}

/// Delivers OTP mail through an HTTP mail API (JSON POST with bearer key).
pub struct HttpMailer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_url,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_otp(&self, to: &str, code: &str) -> anyhow::Result<()> {
        let body = json!({
            "from": self.from,
            "to": to,
            "subject": "Your Verification OTP - FitTrack",
            "text": format!(
                "Your OTP for email verification is: {code}\n\n\
                 This code expires in 5 minutes.\n\n\
                 Do not share this code with anyone."
            ),
        });

        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("mail API returned {status}: {text}");
        }

        info!(%to, "OTP email sent");
        Ok(())
    }
}

/// Used when no mail API is configured; logs the code instead of sending it.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send_otp(&self, to: &str, code: &str) -> anyhow::Result<()> {
        debug!(%to, %code, "mail delivery not configured, dropping OTP email");
        Ok(())
    }
}

pub fn from_config(config: &MailConfig) -> anyhow::Result<std::sync::Arc<dyn Mailer>> {
    match (&config.api_url, &config.api_key) {
        (Some(url), Some(key)) => Ok(std::sync::Arc::new(HttpMailer::new(
            url.clone(),
            key.clone(),
            config.from.clone(),
        )?)),
        _ => Ok(std::sync::Arc::new(NoopMailer)),
    }
}
