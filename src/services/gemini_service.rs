// src/services/gemini_service.rs
use crate::config::Timeouts;
use crate::errors::GourmetError;
use crate::extract::{ExtractedImage, excerpt, extract_image, extract_text};
use crate::fallback::{
    Attempt, Capability, ErrorKind, UpstreamError, conclude, invoke_with_fallback,
    resolve_candidates,
};
use crate::prompts::build_ingredient_detection_prompt;
use crate::services::image_processor::PreparedImage;
use base64::{Engine as _, engine::general_purpose};
use log::warn;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

/// Image-capable models, most preferred first.
pub const IMAGE_MODELS: &[&str] = &[
    "gemini-2.5-flash-image",
    "gemini-2.5-flash-image-preview",
    "gemini-2.0-flash-preview-image-generation",
    "gemini-2.0-flash-exp-image-generation",
];

/// Text models used for ingredient detection.
pub const TEXT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.0-flash", "gemini-1.5-flash"];

fn is_image_family(model: &str) -> bool {
    model.contains("image")
}

fn is_text_family(model: &str) -> bool {
    model.contains("flash") && !model.contains("image")
}

/// Listed models that can read an image and answer in text.
fn is_text_capable(model: &str) -> bool {
    model.starts_with("gemini") && !is_image_family(model)
}

/// Candidate list for one request.
///
/// Without a listing the static preference list is used. With one, only
/// listed models that can serve the capability are tried; an empty result
/// means the key has no such model.
pub fn candidates_for(
    preference: &[&str],
    available: Option<&[String]>,
    is_capable: fn(&str) -> bool,
    is_preferred: fn(&str) -> bool,
) -> Vec<String> {
    let preference: Vec<String> = preference.iter().map(|m| m.to_string()).collect();
    let Some(available) = available.filter(|models| !models.is_empty()) else {
        return preference;
    };

    let capable: Vec<String> = available.iter().filter(|m| is_capable(m)).cloned().collect();
    if capable.is_empty() {
        warn!("None of the {} listed models is capable, skipping generation", available.len());
        return Vec::new();
    }
    resolve_candidates(&preference, Some(capable.as_slice()), is_preferred)
}

pub struct GeminiService {
    api_key: String,
    base_url: String,
    timeouts: Timeouts,
    client: Client,
}

impl GeminiService {
    pub fn new(api_key: String, base_url: String, timeouts: Timeouts) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeouts,
            client: Client::new(),
        }
    }

    /// Models this key may call with `generateContent`, without the
    /// `models/` prefix.
    pub async fn list_models(&self) -> Result<Vec<String>, UpstreamError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .query(&[("pageSize", "1000")])
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeouts.model_listing)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::from_reqwest(&e))?;
        if !status.is_success() {
            return Err(UpstreamError::from_response(status.as_u16(), &body));
        }

        let listing: Value = serde_json::from_str(&body).map_err(|e| {
            UpstreamError::with_kind(ErrorKind::Unknown, format!("Failed to parse model list: {e}"))
        })?;
        Ok(parse_model_listing(&listing))
    }

    /// Listing for one outer request. A failed query is logged and yields
    /// `None` so callers fall back to the static lists.
    pub async fn available_models(&self) -> Option<Vec<String>> {
        match self.list_models().await {
            Ok(models) => Some(models),
            Err(e) => {
                warn!("Model availability query failed, using static list: {e}");
                None
            }
        }
    }

    /// Detect the ingredients visible in a dish photo as a comma-separated list.
    pub async fn detect_ingredients(
        &self,
        image: &PreparedImage,
        available: Option<&[String]>,
    ) -> Result<Attempt<String>, GourmetError> {
        let capability = Capability::IngredientDetection;
        let candidates = candidates_for(TEXT_MODELS, available, is_text_capable, is_text_family);
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": build_ingredient_detection_prompt() },
                    inline_part(image),
                ]
            }]
        });

        let result = invoke_with_fallback(capability.as_str(), &candidates, |model| {
            let body = &body;
            async move {
                let response = self
                    .generate_content(&model, body, self.timeouts.text_generation)
                    .await?;
                extract_text(&response).ok_or_else(|| empty_payload(&model, &response))
            }
        })
        .await;

        conclude(capability, result)
    }

    /// Re-style an uploaded dish photo according to `prompt`.
    pub async fn restyle_image(
        &self,
        prompt: &str,
        image: &PreparedImage,
        available: Option<&[String]>,
    ) -> Result<Attempt<ExtractedImage>, GourmetError> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }, inline_part(image)]
            }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
        });
        self.generate_image(&body, available).await
    }

    /// Generate a dish photo from text alone.
    pub async fn generate_from_text(
        &self,
        prompt: &str,
        available: Option<&[String]>,
    ) -> Result<Attempt<ExtractedImage>, GourmetError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
        });
        self.generate_image(&body, available).await
    }

    async fn generate_image(
        &self,
        body: &Value,
        available: Option<&[String]>,
    ) -> Result<Attempt<ExtractedImage>, GourmetError> {
        let capability = Capability::ImageGeneration;
        let candidates = candidates_for(IMAGE_MODELS, available, is_image_family, is_image_family);

        let result = invoke_with_fallback(capability.as_str(), &candidates, |model| async move {
            let response = self
                .generate_content(&model, body, self.timeouts.image_generation)
                .await?;
            extract_image(&response).ok_or_else(|| empty_payload(&model, &response))
        })
        .await;

        conclude(capability, result)
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header("x-goog-api-key", &self.api_key)
            .timeout(timeout)
            .json(body)
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
                format!("Failed to parse Gemini response: {e}"),
            )
        })
    }
}

fn inline_part(image: &PreparedImage) -> Value {
    json!({
        "inline_data": {
            "mime_type": image.mime_type,
            "data": general_purpose::STANDARD.encode(&image.bytes),
        }
    })
}

fn empty_payload(model: &str, response: &Value) -> UpstreamError {
    warn!(
        "Model {model} returned no usable payload. Body: {}",
        excerpt(&response.to_string(), 500)
    );
    UpstreamError::with_kind(
        ErrorKind::EmptyPayload,
        format!("{model} response contained no usable payload"),
    )
}

fn parse_model_listing(listing: &Value) -> Vec<String> {
    listing["models"]
        .as_array()
        .map(|models| {
            models
                .iter()
                .filter(|m| {
                    m["supportedGenerationMethods"]
                        .as_array()
                        .is_some_and(|methods| {
                            methods.iter().any(|x| x.as_str() == Some("generateContent"))
                        })
                })
                .filter_map(|m| m["name"].as_str())
                .map(|name| name.trim_start_matches("models/").to_string())
                .collect()
        })
        .unwrap_or_default()
}
