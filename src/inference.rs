//! Text-in/text-out access to the language-inference service.
//!
//! The pipeline only ever needs `generate(prompt) -> answer`, so the seam is a
//! single-method trait. `GeminiClient` talks to the Google Generative Language
//! `generateContent` endpoint with a per-request timeout and a bounded retry.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    #[error("inference service not configured: {0}")]
    NotConfigured(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("inference request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("inference request timed out after {0}s")]
    Timeout(u64),

    #[error("inference service returned no text")]
    EmptyResponse,
}

impl InferenceError {
    fn is_retryable(&self) -> bool {
        match self {
            InferenceError::Network(_) | InferenceError::Timeout(_) => true,
            InferenceError::Api { status_code, .. } => *status_code == 429 || *status_code >= 500,
            InferenceError::NotConfigured(_) | InferenceError::EmptyResponse => false,
        }
    }
}

#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError>;
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
    max_retries: u32,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| InferenceError::NotConfigured("GOOGLE_API_KEY is not set".into()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| InferenceError::NotConfigured(e.to_string()))?;

        Ok(Self {
            base_url: GEMINI_BASE_URL.to_string(),
            api_key,
            model: config.model.clone(),
            timeout_secs: config.timeout_secs.max(1),
            max_retries: config.max_retries,
            client,
        })
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, InferenceError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        debug!(model = %self.model, prompt_chars = prompt.len(), "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout(self.timeout_secs)
                } else {
                    InferenceError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            warn!(status, body = %message, "Inference service returned error");
            return Err(InferenceError::Api {
                status_code: status,
                message,
            });
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|e| InferenceError::Api {
                status_code: status,
                message: format!("failed to parse response: {e}"),
            })?;

        parsed.text().ok_or(InferenceError::EmptyResponse)
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let mut attempt = 0;
        loop {
            match self.generate_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let backoff = retry_backoff(attempt);
                    warn!(error = %err, attempt, ?backoff, "Retrying inference request");
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

const BASE_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 30_000;

/// Exponential from 500 ms, capped at 30 s.
fn retry_backoff(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let parsed: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Halo " }, { "text": "semua" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(parsed.text().as_deref(), Some("Halo semua"));
    }

    #[test]
    fn response_without_text_is_empty() {
        let parsed: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({ "candidates": [] })).unwrap();
        assert!(parsed.text().is_none());
    }

    #[test]
    fn missing_api_key_is_not_configured() {
        let config = InferenceConfig {
            api_key: Some("  ".to_string()),
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 30,
            max_retries: 0,
        };
        assert!(matches!(
            GeminiClient::new(&config),
            Err(InferenceError::NotConfigured(_))
        ));
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(retry_backoff(1), Duration::from_millis(500));
        assert_eq!(retry_backoff(2), Duration::from_millis(1_000));
        assert_eq!(retry_backoff(4), Duration::from_millis(4_000));
        assert_eq!(retry_backoff(60), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(retry_backoff(u32::MAX), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn only_transient_errors_are_retried() {
        assert!(InferenceError::Timeout(30).is_retryable());
        assert!(InferenceError::Api { status_code: 503, message: String::new() }.is_retryable());
        assert!(InferenceError::Api { status_code: 429, message: String::new() }.is_retryable());
        assert!(!InferenceError::Api { status_code: 400, message: String::new() }.is_retryable());
        assert!(!InferenceError::EmptyResponse.is_retryable());
    }
}
