// src/services/image_processor.rs
use crate::errors::GourmetError;
use bytes::Bytes;
use image::{GenericImageView, ImageFormat as ImgFormat};

/// Longest side sent to the image model.
const MAX_DIMENSION: u32 = 2048;
/// Inline request payloads above this are re-encoded even when small enough.
const MAX_INLINE_BYTES: usize = 4_000_000;

/// An uploaded photo ready to be sent inline to a model.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub bytes: Bytes,
    pub mime_type: String,
}

pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Decode-check an upload, then downscale it when it would be too large
    /// to send inline.
    pub fn prepare(&self, data: &[u8]) -> Result<PreparedImage, GourmetError> {
        if data.is_empty() {
            return Err(GourmetError::ImageProcessing("Empty image upload".to_string()));
        }

        let format = image::guess_format(data).map_err(|e| {
            GourmetError::ImageProcessing(format!("Unrecognized image format: {}", e))
        })?;
        let img = image::load_from_memory_with_format(data, format)
            .map_err(|e| GourmetError::ImageProcessing(format!("Invalid image: {}", e)))?;

        let (width, height) = img.dimensions();
        if width <= MAX_DIMENSION && height <= MAX_DIMENSION && data.len() <= MAX_INLINE_BYTES {
            return Ok(PreparedImage {
                bytes: Bytes::copy_from_slice(data),
                mime_type: mime_for(format).to_string(),
            });
        }

        let ratio = (MAX_DIMENSION as f32 / width.max(height) as f32).min(1.0);
        let new_width = ((width as f32 * ratio) as u32).max(1);
        let new_height = ((height as f32 * ratio) as u32).max(1);
        log::debug!("Resizing upload from {width}x{height} to {new_width}x{new_height}");

        let resized = img
            .resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
            .to_rgb8();

        let mut output = Vec::new();
        resized
            .write_to(&mut std::io::Cursor::new(&mut output), ImgFormat::Jpeg)
            .map_err(|e| {
                GourmetError::ImageProcessing(format!("Failed to encode resized image: {}", e))
            })?;

        Ok(PreparedImage {
            bytes: Bytes::from(output),
            mime_type: "image/jpeg".to_string(),
        })
    }
}

pub(crate) fn mime_for(format: ImgFormat) -> &'static str {
    match format {
        ImgFormat::Jpeg => "image/jpeg",
        ImgFormat::WebP => "image/webp",
        ImgFormat::Gif => "image/gif",
        _ => "image/png",
    }
}
