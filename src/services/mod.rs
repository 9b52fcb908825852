// src/services/mod.rs
pub mod airtable_service;
pub mod archive;
pub mod claude_service;
pub mod gemini_service;
pub mod image_processor;
pub mod media_host;

pub use airtable_service::{AirtableStore, RecordStore};
pub use claude_service::ClaudeService;
pub use gemini_service::GeminiService;
pub use image_processor::ImageProcessor;
pub use media_host::{ImageHost, ImgurHost, LocalMediaHost};
