use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::config::AiConfig;

#[derive(Debug, thiserror::Error)]
pub enum AiClientError {
    #[error("Gemini provider requires GEMINI_API_KEY and GEMINI_API_URL")]
    NotConfigured,

    #[error("Gemini API error ({status}): {body}")]
    Provider { status: u16, body: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug)]
pub struct AiReply {
    pub text: String,
    pub raw: Value,
}

/// Thin client for the Gemini generateContent endpoint.
#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    config: AiConfig,
}

impl AiClient {
    pub fn new(config: AiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub async fn generate(&self, system: &str, user: &str) -> Result<AiReply, AiClientError> {
        let (Some(api_url), Some(api_key)) = (&self.config.api_url, &self.config.api_key) else {
            return Err(AiClientError::NotConfigured);
        };

        let payload = build_request_body(system, user);
        debug!(model = %self.config.model, "calling gemini");

        let resp = self
            .http
            .post(api_url)
            .header("X-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiClientError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = resp.json().await?;
        let text = extract_text(&raw).unwrap_or_else(|| raw.to_string());
        Ok(AiReply { text, raw })
    }
}

/// Gemini v1beta body: system prompt rides in `system_instruction`, the user
/// message in `contents`.
pub(crate) fn build_request_body(system: &str, user: &str) -> Value {
    json!({
        "system_instruction": {
            "parts": [{ "text": system }]
        },
        "contents": [
            { "role": "user", "parts": [{ "text": user }] }
        ]
    })
}

/// Pull the assistant text out of a Gemini response, falling back to the
/// OpenAI-compatible shapes some proxy endpoints return.
pub(crate) fn extract_text(raw: &Value) -> Option<String> {
    raw.pointer("/candidates/0/content/parts/0/text")
        .or_else(|| raw.pointer("/choices/0/message/content"))
        .or_else(|| raw.pointer("/choices/0/text"))
        .and_then(|v| v.as_str())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_system_and_user_parts() {
        let body = build_request_body("be terse", "plan me a workout");
        assert_eq!(
            body.pointer("/system_instruction/parts/0/text").unwrap(),
            "be terse"
        );
        assert_eq!(body.pointer("/contents/0/role").unwrap(), "user");
        assert_eq!(
            body.pointer("/contents/0/parts/0/text").unwrap(),
            "plan me a workout"
        );
    }

    #[test]
    fn extract_text_reads_gemini_shape() {
        let raw = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "1. Squats x10" }] } }
            ]
        });
        assert_eq!(extract_text(&raw).as_deref(), Some("1. Squats x10"));
    }

    #[test]
    fn extract_text_falls_back_to_openai_shapes() {
        let chat = json!({ "choices": [{ "message": { "content": "hi" } }] });
        assert_eq!(extract_text(&chat).as_deref(), Some("hi"));

        let completion = json!({ "choices": [{ "text": "hello" }] });
        assert_eq!(extract_text(&completion).as_deref(), Some("hello"));
    }

    #[test]
    fn extract_text_none_for_unknown_shape() {
        assert!(extract_text(&json!({ "weird": true })).is_none());
    }

    #[tokio::test]
    async fn generate_fails_fast_when_unconfigured() {
        let client = AiClient::new(AiConfig {
            api_url: None,
            api_key: None,
            model: "gemini-2.0-flash".into(),
        })
        .expect("client");
        let err = client.generate("sys", "user").await.unwrap_err();
        assert!(matches!(err, AiClientError::NotConfigured));
    }
}
