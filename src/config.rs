// src/config.rs
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_AIRTABLE_BASE_URL: &str = "https://api.airtable.com/v0";
pub const DEFAULT_IMGUR_BASE_URL: &str = "https://api.imgur.com/3";

#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub api_key: String,
    pub base_id: String,
    pub table: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct Timeouts {
    pub image_generation: Duration,
    pub text_generation: Duration,
    pub model_listing: Duration,
    pub persistence: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            image_generation: Duration::from_secs(60),
            text_generation: Duration::from_secs(30),
            model_listing: Duration::from_secs(15),
            persistence: Duration::from_secs(30),
        }
    }
}

/// Token bucket applied per client IP.
#[derive(Debug, Clone)]
pub struct RateLimit {
    /// One request is replenished every `replenish_ms`.
    pub replenish_ms: u64,
    pub burst: u32,
}

/// Process configuration, read once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub airtable: Option<AirtableConfig>,
    pub imgur_client_id: Option<String>,
    pub imgur_base_url: String,
    /// Public base URL this service is reachable at (e.g. a tunnel), used
    /// to build links to locally hosted images.
    pub public_url: Option<String>,
    pub media_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub body_limit_bytes: usize,
    /// Comma-separated allowed origins, or `*`.
    pub cors_origins: String,
    pub rate_limit: RateLimit,
    pub timeouts: Timeouts,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let gemini_api_key = required("GEMINI_API_KEY")?;

        let airtable = match (optional("AIRTABLE_API_KEY"), optional("AIRTABLE_BASE_ID")) {
            (Some(api_key), Some(base_id)) => Some(AirtableConfig {
                api_key,
                base_id,
                table: optional("AIRTABLE_TABLE_NAME").unwrap_or_else(|| "Generaciones".into()),
                base_url: optional("AIRTABLE_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_AIRTABLE_BASE_URL.into()),
            }),
            _ => None,
        };

        let host = optional("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or("PORT", 8080)?;
        let body_limit_mb: usize = parse_or("BODY_LIMIT_MB", 20)?;

        let defaults = Timeouts::default();
        let timeouts = Timeouts {
            image_generation: secs_or("IMAGE_TIMEOUT_SECS", defaults.image_generation)?,
            text_generation: secs_or("TEXT_TIMEOUT_SECS", defaults.text_generation)?,
            model_listing: secs_or("MODEL_LIST_TIMEOUT_SECS", defaults.model_listing)?,
            persistence: secs_or("PERSISTENCE_TIMEOUT_SECS", defaults.persistence)?,
        };

        Ok(Self {
            bind_addr: format!("{host}:{port}"),
            gemini_api_key,
            gemini_base_url: optional("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
            anthropic_api_key: optional("ANTHROPIC_API_KEY"),
            anthropic_base_url: optional("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.into()),
            airtable,
            imgur_client_id: optional("IMGUR_CLIENT_ID"),
            imgur_base_url: optional("IMGUR_BASE_URL")
                .unwrap_or_else(|| DEFAULT_IMGUR_BASE_URL.into()),
            public_url: optional("PUBLIC_URL").map(|u| u.trim_end_matches('/').to_string()),
            media_dir: optional("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./media")),
            static_dir: optional("STATIC_DIR").map(PathBuf::from),
            body_limit_bytes: body_limit_mb * 1024 * 1024,
            cors_origins: optional("CORS_ORIGINS").unwrap_or_else(|| "*".into()),
            rate_limit: RateLimit {
                replenish_ms: parse_or("RATE_LIMIT_REPLENISH_MS", 500)?,
                burst: parse_or("RATE_LIMIT_BURST", 30)?,
            },
            timeouts,
        })
    }

    /// Local hosting is only possible when the service knows its own
    /// public address and Imgur is not configured.
    pub fn serves_local_media(&self) -> bool {
        self.imgur_client_id.is_none() && self.public_url.is_some()
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(name: &str) -> Result<String> {
    optional(name).with_context(|| format!("{name} must be set"))
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(name) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

fn secs_or(name: &str, default: Duration) -> Result<Duration> {
    parse_or(name, default.as_secs()).map(Duration::from_secs)
}
