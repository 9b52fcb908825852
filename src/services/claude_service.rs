// src/services/claude_service.rs
use crate::errors::GourmetError;
use crate::extract::{excerpt, extract_text};
use crate::fallback::{
    Attempt, Capability, ErrorKind, UpstreamError, conclude, invoke_with_fallback,
};
use log::warn;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

/// Claude models tried for recipes, most preferred first.
pub const RECIPE_MODELS: &[&str] = &[
    "claude-sonnet-4-20250514",
    "claude-3-7-sonnet-20250219",
    "claude-3-5-sonnet-20241022",
    "claude-3-5-haiku-20241022",
];

pub struct ClaudeService {
    api_key: String,
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl ClaudeService {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: Client::new(),
        }
    }

    /// Markdown recipe for `prompt`.
    pub async fn generate_recipe(&self, prompt: &str) -> Result<Attempt<String>, GourmetError> {
        let capability = Capability::Recipe;
        let candidates: Vec<String> = RECIPE_MODELS.iter().map(|m| m.to_string()).collect();

        let result = invoke_with_fallback(capability.as_str(), &candidates, |model| async move {
            let response = self.create_message(&model, prompt).await?;
            extract_text(&response).ok_or_else(|| {
                warn!(
                    "Model {model} returned no recipe text. Body: {}",
                    excerpt(&response.to_string(), 500)
                );
                UpstreamError::with_kind(
                    ErrorKind::EmptyPayload,
                    format!("{model} response contained no text"),
                )
            })
        })
        .await;

        conclude(capability, result)
    }

    async fn create_message(&self, model: &str, prompt: &str) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&json!({
                "model": model,
                "max_tokens": MAX_TOKENS,
                "messages": [{ "role": "user", "content": prompt }]
            }))
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::from_reqwest(&e))?;
        if !status.is_success() {
            return Err(UpstreamError::from_response(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            UpstreamError::with_kind(
                ErrorKind::Unknown,
                format!("Failed to parse Anthropic response: {e}"),
            )
        })
    }
}
