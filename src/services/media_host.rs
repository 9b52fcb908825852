// src/services/media_host.rs
//! Turns image bytes into a public URL, since the record store only
//! accepts attachments by URL.

use crate::errors::GourmetError;
use crate::extract::ExtractedImage;
use crate::fallback::{ErrorKind, UpstreamError};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::{Client, multipart};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn host(&self, image: &ExtractedImage) -> Result<String, GourmetError>;
    fn name(&self) -> &str;
}

pub struct ImgurHost {
    client_id: String,
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl ImgurHost {
    pub fn new(client_id: String, base_url: String, timeout: Duration) -> Self {
        Self {
            client_id,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl ImageHost for ImgurHost {
    async fn host(&self, image: &ExtractedImage) -> Result<String, GourmetError> {
        let form = multipart::Form::new()
            .text("image", general_purpose::STANDARD.encode(&image.bytes))
            .text("type", "base64");

        let response = self
            .client
            .post(format!("{}/image", self.base_url))
            .header("Authorization", format!("Client-ID {}", self.client_id))
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| hosting_error(UpstreamError::from_reqwest(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| hosting_error(UpstreamError::from_reqwest(&e)))?;
        if !status.is_success() {
            return Err(hosting_error(UpstreamError::from_response(status.as_u16(), &body)));
        }

        let parsed: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| GourmetError::Persistence(format!("Failed to parse Imgur response: {}", e)))?;
        parsed["data"]["link"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| GourmetError::Persistence("No link in Imgur response".to_string()))
    }

    fn name(&self) -> &str {
        "imgur"
    }
}

/// Stores images under `media_dir`, served by this process at
/// `{public_url}/media/`.
pub struct LocalMediaHost {
    media_dir: PathBuf,
    public_url: String,
}

impl LocalMediaHost {
    pub fn new(media_dir: PathBuf, public_url: String) -> Self {
        Self {
            media_dir,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageHost for LocalMediaHost {
    async fn host(&self, image: &ExtractedImage) -> Result<String, GourmetError> {
        let file_name = format!("{}.{}", Uuid::new_v4(), image.extension());
        tokio::fs::create_dir_all(&self.media_dir)
            .await
            .map_err(|e| GourmetError::Persistence(format!("Failed to create media dir: {}", e)))?;
        tokio::fs::write(self.media_dir.join(&file_name), &image.bytes)
            .await
            .map_err(|e| GourmetError::Persistence(format!("Failed to write image: {}", e)))?;
        Ok(format!("{}/media/{}", self.public_url, file_name))
    }

    fn name(&self) -> &str {
        "local"
    }
}

fn hosting_error(error: UpstreamError) -> GourmetError {
    match error.kind {
        ErrorKind::AuthDenied => GourmetError::Auth(format!("Image host: {error}")),
        ErrorKind::Timeout => GourmetError::Timeout(format!("Image host: {error}")),
        _ => GourmetError::Persistence(format!("Image upload failed: {}", error.message)),
    }
}
