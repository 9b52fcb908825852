// src/main.rs
use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{App, HttpServer, http::header, middleware, web};
use anyhow::Context;
use log::{info, warn};
use std::sync::Arc;

mod catalog;
mod config;
mod errors;
mod extract;
mod fallback;
mod handlers;
mod models;
mod prompts;
mod services;
mod summary;

use crate::config::Config;
use crate::services::{
    AirtableStore, ClaudeService, GeminiService, ImageHost, ImageProcessor, ImgurHost,
    LocalMediaHost, RecordStore,
};

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    gemini: Arc<GeminiService>,
    claude: Option<Arc<ClaudeService>>,
    records: Option<Arc<dyn RecordStore>>,
    media: Option<Arc<dyn ImageHost>>,
    image_processor: Arc<ImageProcessor>,
}

impl AppState {
    fn from_config(config: Config) -> Self {
        let timeouts = config.timeouts.clone();

        let gemini = Arc::new(GeminiService::new(
            config.gemini_api_key.clone(),
            config.gemini_base_url.clone(),
            timeouts.clone(),
        ));

        let claude = config.anthropic_api_key.clone().map(|key| {
            Arc::new(ClaudeService::new(
                key,
                config.anthropic_base_url.clone(),
                timeouts.text_generation,
            ))
        });
        if claude.is_none() {
            warn!("ANTHROPIC_API_KEY not set, recipe generation disabled");
        }

        let records = config.airtable.clone().map(|airtable| {
            Arc::new(AirtableStore::new(airtable, timeouts.persistence)) as Arc<dyn RecordStore>
        });
        if records.is_none() {
            warn!("Airtable not configured, records and history disabled");
        }

        let media: Option<Arc<dyn ImageHost>> = match (&config.imgur_client_id, &config.public_url)
        {
            (Some(client_id), _) => Some(Arc::new(ImgurHost::new(
                client_id.clone(),
                config.imgur_base_url.clone(),
                timeouts.persistence,
            ))),
            (None, Some(public_url)) => Some(Arc::new(LocalMediaHost::new(
                config.media_dir.clone(),
                public_url.clone(),
            ))),
            (None, None) => None,
        };
        match &media {
            Some(host) => info!("Hosting images via {}", host.name()),
            None => warn!("No image host configured, inline images cannot be saved"),
        }

        Self {
            config: Arc::new(config),
            gemini,
            claude,
            records,
            media,
            image_processor: Arc::new(ImageProcessor::new()),
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting GourmetAI service...");

    let config = Config::from_env()?;
    if config.serves_local_media() {
        std::fs::create_dir_all(&config.media_dir).with_context(|| {
            format!("Failed to create media dir {}", config.media_dir.display())
        })?;
    }

    let rate_limit = GovernorConfigBuilder::default()
        .per_millisecond(config.rate_limit.replenish_ms)
        .burst_size(config.rate_limit.burst)
        .finish()
        .context("RATE_LIMIT_REPLENISH_MS and RATE_LIMIT_BURST must be non-zero")?;

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::from_config(config);

    info!("Starting HTTP server on {}", bind_addr);

    HttpServer::new(move || {
        let config = app_state.config.clone();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().limit(config.body_limit_bytes))
            .app_data(web::PayloadConfig::new(config.body_limit_bytes))
            .wrap(Governor::new(&rate_limit))
            .wrap(cors(&config.cors_origins))
            .wrap(middleware::Logger::default())
            .configure(handlers::configure_api)
            .configure(|cfg| {
                if config.serves_local_media() {
                    cfg.service(actix_files::Files::new("/media", &config.media_dir));
                }
                if let Some(dir) = &config.static_dir {
                    cfg.service(actix_files::Files::new("/", dir).index_file("index.html"));
                }
            })
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}

/// CORS policy for a comma-separated origin list; `*` allows any origin.
fn cors(allowed: &str) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(3600);

    let origins: Vec<&str> = allowed
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .collect();
    if origins.is_empty() || origins.contains(&"*") {
        return cors.allow_any_origin();
    }
    origins
        .into_iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{HttpResponse, http::Method, test};

    macro_rules! app {
        ($origins:expr) => {
            test::init_service(
                App::new()
                    .wrap(cors($origins))
                    .route("/api/health", web::get().to(|| async { HttpResponse::Ok().finish() })),
            )
            .await
        };
    }

    fn preflight(origin: &str) -> test::TestRequest {
        test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/api/health")
            .insert_header((header::ORIGIN, origin))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type"))
    }

    #[actix_web::test]
    async fn preflight_from_a_listed_origin_is_allowed() {
        let app = app!("https://a.example, https://b.example");
        let resp = test::call_service(&app, preflight("https://b.example").to_request()).await;
        assert!(resp.status().is_success());

        let headers = resp.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://b.example"
        );
        let allowed_headers = headers
            .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .unwrap()
            .to_str()
            .unwrap()
            .to_lowercase();
        assert!(allowed_headers.contains("content-type"));
    }

    #[actix_web::test]
    async fn responses_vary_by_origin() {
        let app = app!("https://a.example");
        let req = test::TestRequest::get()
            .uri("/api/health")
            .insert_header((header::ORIGIN, "https://a.example"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let vary = resp.headers().get(header::VARY).unwrap().to_str().unwrap();
        assert!(vary.contains("Origin"));
    }

    #[actix_web::test]
    async fn unlisted_origins_get_no_allow_header() {
        let app = app!("https://a.example");
        let resp = test::call_service(&app, preflight("https://evil.example").to_request()).await;
        assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[actix_web::test]
    async fn wildcard_allows_any_origin() {
        let app = app!("*");
        let resp = test::call_service(&app, preflight("https://anywhere.example").to_request()).await;
        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://anywhere.example"
        );
    }
}
