// src/extract.rs
//! Pulls the useful payload out of model responses whose envelope shape
//! varies between API versions and models.

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static DATA_URI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"data:(image/[A-Za-z0-9.+-]+);base64,([A-Za-z0-9+/=]+)").expect("valid regex")
});

const DEFAULT_IMAGE_MIME: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    pub bytes: Bytes,
    pub mime_type: String,
}

impl ExtractedImage {
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

/// Locate image bytes in a generation response. Tries, in order: the first
/// candidate's parts, top-level parts, then a `data:` URI inside any
/// top-level string field.
pub fn extract_image(response: &Value) -> Option<ExtractedImage> {
    inline_image(&response["candidates"][0]["content"]["parts"])
        .or_else(|| inline_image(&response["parts"]))
        .or_else(|| {
            response
                .as_object()?
                .values()
                .filter_map(Value::as_str)
                .find_map(decode_data_uri)
        })
}

/// Plain text answer of a Gemini or Claude response. `None` when absent or
/// blank.
pub fn extract_text(response: &Value) -> Option<String> {
    let text = response["text"]
        .as_str()
        .map(str::to_string)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| {
            join_text(&response["candidates"][0]["content"]["parts"], "")
        })
        .or_else(|| join_text(&response["content"], "\n"))?;

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Decode a `data:image/...;base64,` URI found anywhere in `text`.
pub fn decode_data_uri(text: &str) -> Option<ExtractedImage> {
    let captures = DATA_URI_RE.captures(text)?;
    let bytes = general_purpose::STANDARD.decode(&captures[2]).ok()?;
    (!bytes.is_empty()).then(|| ExtractedImage {
        bytes: Bytes::from(bytes),
        mime_type: captures[1].to_string(),
    })
}

/// First `max` characters of `text`, for logging raw upstream bodies.
pub fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max).collect();
    short.push_str("...");
    short
}

fn inline_image(parts: &Value) -> Option<ExtractedImage> {
    parts.as_array()?.iter().find_map(|part| {
        let inline = part.get("inlineData").or_else(|| part.get("inline_data"))?;
        let data = inline.get("data")?.as_str()?;
        let bytes = general_purpose::STANDARD.decode(data).ok()?;
        if bytes.is_empty() {
            return None;
        }
        let mime_type = inline
            .get("mimeType")
            .or_else(|| inline.get("mime_type"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_IMAGE_MIME);
        Some(ExtractedImage {
            bytes: Bytes::from(bytes),
            mime_type: mime_type.to_string(),
        })
    })
}

/// Concatenate the text of every non-thought part in a parts/content array.
fn join_text(parts: &Value, separator: &str) -> Option<String> {
    let texts: Vec<&str> = parts
        .as_array()?
        .iter()
        .filter(|part| !part["thought"].as_bool().unwrap_or(false))
        .filter_map(|part| part["text"].as_str())
        .filter(|t| !t.trim().is_empty())
        .collect();
    (!texts.is_empty()).then(|| texts.join(separator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PNG_B64: &str = "iVBORw0KGgo=";

    #[test]
    fn image_from_candidate_parts() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Aquí tienes tu plato" },
                    { "inlineData": { "mimeType": "image/jpeg", "data": PNG_B64 } }
                ]}
            }]
        });
        let image = extract_image(&response).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(&image.bytes[..4], &[0x89, b'P', b'N', b'G']);
        assert_eq!(image.extension(), "jpg");
    }

    #[test]
    fn image_from_top_level_parts_with_snake_case() {
        let response = json!({
            "parts": [{ "inline_data": { "mime_type": "image/png", "data": PNG_B64 } }]
        });
        assert_eq!(extract_image(&response).unwrap().mime_type, "image/png");
    }

    #[test]
    fn image_from_embedded_data_uri() {
        let response = json!({
            "text": format!("resultado: data:image/webp;base64,{PNG_B64} listo")
        });
        let image = extract_image(&response).unwrap();
        assert_eq!(image.mime_type, "image/webp");
        assert!(image.to_data_uri().starts_with("data:image/webp;base64,"));
    }

    #[test]
    fn missing_image_yields_none() {
        assert_eq!(extract_image(&json!({})), None);
        assert_eq!(extract_image(&json!({ "candidates": [] })), None);
        assert_eq!(
            extract_image(&json!({
                "candidates": [{ "content": { "parts": [{ "text": "no puedo" }] } }]
            })),
            None
        );
        assert_eq!(extract_image(&json!("not an object")), None);
    }

    #[test]
    fn text_from_gemini_parts_skips_thoughts() {
        let response = json!({
            "candidates": [{ "content": { "parts": [
                { "text": "pensando...", "thought": true },
                { "text": "tomate, " },
                { "text": "albahaca\n" }
            ]}}]
        });
        assert_eq!(extract_text(&response).as_deref(), Some("tomate, albahaca"));
    }

    #[test]
    fn text_from_claude_content_blocks() {
        let response = json!({
            "content": [{ "type": "text", "text": "# Receta\n\nPaso 1" }]
        });
        assert_eq!(extract_text(&response).as_deref(), Some("# Receta\n\nPaso 1"));
    }

    #[test]
    fn blank_text_is_none() {
        assert_eq!(extract_text(&json!({ "text": "   " })), None);
        assert_eq!(extract_text(&json!({})), None);
    }
}
