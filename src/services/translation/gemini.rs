use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::debug;

use super::gateway::Backend;
use crate::error::{ConfigError, LlmError};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const TIMEOUT_SECS: u64 = 300;

/// Google Gemini `generateContent` over blocking HTTP.
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl GeminiBackend {
    pub fn new(api_key: &str, model: &str) -> Result<Self, ConfigError> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| ConfigError::Http(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            base_url: BASE_URL.to_string(),
            temperature: 0.3,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl Backend for GeminiBackend {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": { "temperature": self.temperature }
        });

        debug!("POST {} ({} prompt chars)", self.endpoint(), prompt.chars().count());

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| LlmError::TransientFailure(e.to_string()))?;

        let status = resp.status();

        // Read as text first so error bodies are not lost when JSON fails.
        let text = resp
            .text()
            .map_err(|e| LlmError::TransientFailure(e.to_string()))?;

        if !status.is_success() {
            let message = extract_error_message(status, &text);
            return Err(classify(Some(status), message));
        }

        let v: Value = serde_json::from_str(&text)
            .map_err(|_| LlmError::TransientFailure("invalid JSON from model".into()))?;

        extract_text(&v).ok_or_else(|| {
            let reason = v
                .pointer("/candidates/0/finishReason")
                .or_else(|| v.pointer("/promptFeedback/blockReason"))
                .and_then(Value::as_str)
                .unwrap_or("missing candidates[0].content.parts");
            LlmError::TransientFailure(format!("empty model reply: {reason}"))
        })
    }
}

/// Concatenated text parts of the first candidate.
fn extract_text(v: &Value) -> Option<String> {
    let parts = v.pointer("/candidates/0/content/parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Map an HTTP failure onto the gateway's error kinds.
pub fn classify(status: Option<StatusCode>, message: String) -> LlmError {
    let lower = message.to_lowercase();
    let quota = status == Some(StatusCode::TOO_MANY_REQUESTS)
        || message.contains("RESOURCE_EXHAUSTED")
        || lower.contains("quota");

    if quota {
        LlmError::QuotaExceeded(message)
    } else {
        LlmError::TransientFailure(message)
    }
}

fn extract_error_message(status: StatusCode, body_text: &str) -> String {
    // Gemini: { "error": { "code": 429, "message": "...", "status": "RESOURCE_EXHAUSTED" } }
    if let Ok(v) = serde_json::from_str::<Value>(body_text) {
        if let Some(err) = v.get("error") {
            let msg = err.get("message").and_then(Value::as_str).unwrap_or("");
            let kind = err.get("status").and_then(Value::as_str).unwrap_or("");
            return format!("HTTP {} {}: {}", status.as_u16(), kind, msg);
        }
    }

    let trimmed = body_text.trim();
    let snippet = match trimmed.char_indices().nth(400) {
        Some((i, _)) => format!("{}...", &trimmed[..i]),
        None => trimmed.to_string(),
    };

    format!("HTTP {}: {}", status.as_u16(), snippet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_key_is_a_config_error() {
        assert!(matches!(
            GeminiBackend::new("  ", DEFAULT_MODEL),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn endpoint_includes_model() {
        let b = GeminiBackend::new("k", "gemini-test")
            .unwrap()
            .with_base_url("http://localhost:9/v1beta/");
        assert_eq!(
            b.endpoint(),
            "http://localhost:9/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn classifies_quota_errors() {
        assert!(matches!(
            classify(Some(StatusCode::TOO_MANY_REQUESTS), "slow down".into()),
            LlmError::QuotaExceeded(_)
        ));
        assert!(matches!(
            classify(Some(StatusCode::FORBIDDEN), "HTTP 403 RESOURCE_EXHAUSTED: x".into()),
            LlmError::QuotaExceeded(_)
        ));
        assert!(matches!(
            classify(None, "Daily Quota reached".into()),
            LlmError::QuotaExceeded(_)
        ));
        assert!(matches!(
            classify(Some(StatusCode::INTERNAL_SERVER_ERROR), "boom".into()),
            LlmError::TransientFailure(_)
        ));
    }

    #[test]
    fn error_body_message_is_extracted() {
        let body = r#"{"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}}"#;
        let msg = extract_error_message(StatusCode::TOO_MANY_REQUESTS, body);
        assert_eq!(
            msg,
            "HTTP 429 RESOURCE_EXHAUSTED: Resource has been exhausted"
        );
    }

    #[test]
    fn text_parts_are_joined() {
        let v = json!({
            "candidates": [
                { "content": { "parts": [ { "text": "TITLE: " }, { "text": "Olá" } ] } }
            ]
        });
        assert_eq!(extract_text(&v).as_deref(), Some("TITLE: Olá"));
        assert_eq!(extract_text(&json!({ "candidates": [] })), None);
    }
}
