// src/services/archive.rs
//! Assembles and persists a generation record: images are hosted first so
//! the record only carries URLs.

use crate::errors::GourmetError;
use crate::extract::{ExtractedImage, decode_data_uri};
use crate::models::{GenerationParameters, GenerationRecord};
use crate::services::image_processor::mime_for;
use crate::services::{ImageHost, RecordStore};
use crate::summary::{classify_ingredients, summarize};
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use log::info;
use rand::Rng;

const SEED_RANGE: std::ops::Range<u32> = 0..1_000_000;

/// An image as received from a client or produced by a model.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Hosted(String),
    Inline(ExtractedImage),
}

impl ImageSource {
    /// Accepts an http(s) URL, a `data:` URI or bare base64 image bytes.
    pub fn parse(raw: &str) -> Result<Self, GourmetError> {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(ImageSource::Hosted(raw.to_string()));
        }
        if raw.starts_with("data:") {
            return decode_data_uri(raw)
                .map(ImageSource::Inline)
                .ok_or_else(|| GourmetError::BadRequest("Malformed image data URI".to_string()));
        }

        let bytes = general_purpose::STANDARD
            .decode(raw)
            .map_err(|_| GourmetError::BadRequest("Image is neither a URL nor base64".to_string()))?;
        let format = image::guess_format(&bytes)
            .map_err(|_| GourmetError::BadRequest("Unrecognized image format".to_string()))?;
        Ok(ImageSource::Inline(ExtractedImage {
            bytes: Bytes::from(bytes),
            mime_type: mime_for(format).to_string(),
        }))
    }
}

/// Everything needed to persist one generation.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub original: Option<ImageSource>,
    pub generated: Vec<ImageSource>,
    pub parameters: GenerationParameters,
    pub ingredients: String,
    pub seed: u32,
}

pub fn new_seed() -> u32 {
    rand::thread_rng().gen_range(SEED_RANGE)
}

/// Host any inline images, then create the record. Returns the record id.
pub async fn save_generation(
    records: &dyn RecordStore,
    media: Option<&dyn ImageHost>,
    draft: RecordDraft,
) -> Result<String, GourmetError> {
    if draft.generated.is_empty() {
        return Err(GourmetError::BadRequest(
            "At least one generated image is required".to_string(),
        ));
    }

    let original_image_url = match &draft.original {
        Some(source) => Some(resolve_url(media, source).await?),
        None => None,
    };
    let mut generated_image_urls = Vec::with_capacity(draft.generated.len());
    for source in &draft.generated {
        generated_image_urls.push(resolve_url(media, source).await?);
    }

    let record = GenerationRecord {
        original_image_url,
        generated_image_urls,
        summary: summarize(&draft.parameters),
        ingredient_category: classify_ingredients(&draft.ingredients),
        parameters: draft.parameters,
        seed: draft.seed,
        ingredients: draft.ingredients,
        created_at: chrono::Utc::now(),
    };

    let id = records.create(&record).await?;
    info!("Saved generation record {id}");
    Ok(id)
}

async fn resolve_url(
    media: Option<&dyn ImageHost>,
    source: &ImageSource,
) -> Result<String, GourmetError> {
    match source {
        ImageSource::Hosted(url) => Ok(url.clone()),
        ImageSource::Inline(image) => {
            let host = media.ok_or(GourmetError::NotConfigured("image hosting"))?;
            let url = host.host(image).await?;
            log::debug!("Hosted image on {}: {url}", host.name());
            Ok(url)
        }
    }
}
