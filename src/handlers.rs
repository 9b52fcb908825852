// src/handlers.rs
use crate::extract::ExtractedImage;
use crate::models::*;
use crate::prompts::{build_image_prompt, build_recipe_prompt, build_scratch_image_prompt};
use crate::services::archive::{ImageSource, RecordDraft, new_seed, save_generation};
use crate::summary::{classify_ingredients, summarize};
use crate::{AppState, errors::GourmetError};
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use futures_util::TryStreamExt;
use log::{info, warn};

const DEFAULT_HISTORY_RECORDS: u32 = 20;
const MAX_HISTORY_RECORDS: u32 = 100;

pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .route("/analyze", web::post().to(analyze_image))
            .route("/generate", web::post().to(generate_image))
            .route("/generate-from-scratch", web::post().to(generate_from_scratch))
            .route("/recipe", web::post().to(generate_recipe))
            .route("/records", web::post().to(save_record))
            .route("/history", web::get().to(get_history)),
    );
}

pub async fn health_check(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "gourmet-ai",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "gemini": true,
            "claude": data.claude.is_some(),
            "records": data.records.is_some(),
            "imageHosting": data.media.as_ref().map(|m| m.name().to_string()),
        },
        "publicUrl": data.config.public_url,
    }))
}

/// Fields of the multipart upload used by `/analyze` and `/generate`.
#[derive(Debug, Default)]
struct UploadForm {
    image: Option<Vec<u8>>,
    parameters: Option<String>,
    ingredients: Option<String>,
    save: bool,
}

async fn read_upload(mut payload: Multipart, limit: usize) -> Result<UploadForm, Error> {
    let mut form = UploadForm::default();
    let mut total = 0usize;

    while let Some(mut field) = payload.try_next().await? {
        let name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            total += chunk.len();
            if total > limit {
                return Err(GourmetError::BadRequest(format!(
                    "Upload exceeds {} bytes",
                    limit
                ))
                .into());
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "image" => form.image = Some(data),
            "parameters" => form.parameters = Some(field_text(&name, data)?),
            "ingredients" => form.ingredients = Some(field_text(&name, data)?),
            "save" => form.save = field_text(&name, data)?.trim() == "true",
            other => warn!("Ignoring unexpected upload field: {other}"),
        }
    }

    Ok(form)
}

fn field_text(name: &str, data: Vec<u8>) -> Result<String, GourmetError> {
    String::from_utf8(data)
        .map_err(|_| GourmetError::BadRequest(format!("Field {name} is not valid UTF-8")))
}

fn parse_parameters(raw: Option<&str>) -> Result<GenerationParameters, GourmetError> {
    let raw = raw.ok_or_else(|| GourmetError::BadRequest("Missing parameters".to_string()))?;
    serde_json::from_str(raw)
        .map_err(|e| GourmetError::BadRequest(format!("Invalid parameters: {}", e)))
}

pub async fn analyze_image(
    payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let form = read_upload(payload, data.config.body_limit_bytes).await?;
    let upload = form
        .image
        .ok_or_else(|| GourmetError::BadRequest("Missing image".to_string()))?;
    let image = data.image_processor.prepare(&upload)?;

    let available = data.gemini.available_models().await;
    let detected = data
        .gemini
        .detect_ingredients(&image, available.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(IngredientAnalysis {
        ingredient_category: classify_ingredients(&detected.value),
        ingredients: detected.value,
        model: detected.model,
    }))
}

pub async fn generate_image(
    payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let form = read_upload(payload, data.config.body_limit_bytes).await?;

    // Parameters are checked before the image so a bad request never
    // reaches an external service.
    let params = parse_parameters(form.parameters.as_deref())?;
    params.validate().map_err(GourmetError::from)?;

    let upload = form
        .image
        .ok_or_else(|| GourmetError::BadRequest("Missing image".to_string()))?;
    let image = data.image_processor.prepare(&upload)?;

    // One availability query serves both detection and generation.
    let available = data.gemini.available_models().await;
    let ingredients = match form.ingredients.filter(|i| !i.trim().is_empty()) {
        Some(supplied) => supplied.trim().to_string(),
        None => {
            data.gemini
                .detect_ingredients(&image, available.as_deref())
                .await?
                .value
        }
    };

    let prompt = build_image_prompt(&params, &ingredients);
    let generated = data
        .gemini
        .restyle_image(&prompt, &image, available.as_deref())
        .await?;
    let seed = new_seed();

    let mut response = GenerateResponse {
        generated_image: generated.value.to_data_uri(),
        model: generated.model,
        ingredient_category: classify_ingredients(&ingredients),
        summary: summarize(&params),
        seed,
        ingredients,
        record_id: None,
        warning: None,
    };

    if form.save {
        let draft = RecordDraft {
            original: Some(ImageSource::Inline(ExtractedImage {
                bytes: image.bytes.clone(),
                mime_type: image.mime_type.clone(),
            })),
            generated: vec![ImageSource::Inline(generated.value)],
            parameters: params,
            ingredients: response.ingredients.clone(),
            seed,
        };
        // A failed save never discards a successful generation.
        match persist(&data, draft).await {
            Ok(id) => response.record_id = Some(id),
            Err(e) => {
                warn!("Generation succeeded but could not be saved: {e}");
                response.warning = Some(format!(
                    "image generated but not saved: {}",
                    e.user_message()
                ));
            }
        }
    }

    Ok(HttpResponse::Ok().json(response))
}

pub async fn generate_from_scratch(
    body: web::Json<ScratchRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let request = body.into_inner();
    if request.idea.trim().is_empty() {
        return Err(GourmetError::BadRequest("Missing dish idea".to_string()).into());
    }
    request.parameters.validate().map_err(GourmetError::from)?;

    let prompt = build_scratch_image_prompt(&request.idea, &request.parameters);
    let available = data.gemini.available_models().await;
    let generated = data
        .gemini
        .generate_from_text(&prompt, available.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(GenerateResponse {
        generated_image: generated.value.to_data_uri(),
        model: generated.model,
        ingredients: String::new(),
        ingredient_category: classify_ingredients(&request.idea),
        summary: summarize(&request.parameters),
        seed: new_seed(),
        record_id: None,
        warning: None,
    }))
}

pub async fn generate_recipe(
    body: web::Json<RecipeRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let claude = data
        .claude
        .as_ref()
        .ok_or(GourmetError::NotConfigured("recipe service"))?;

    let request = body.into_inner();
    let prompt = build_recipe_prompt(
        request.idea.as_deref(),
        &request.parameters,
        &request.ingredients,
    );
    let recipe = claude.generate_recipe(&prompt).await?;

    Ok(HttpResponse::Ok().json(RecipeResponse {
        recipe: recipe.value,
        model: recipe.model,
    }))
}

pub async fn save_record(
    body: web::Json<SaveRecordRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let request = body.into_inner();
    let original = request
        .original_image
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .map(ImageSource::parse)
        .transpose()?;
    let generated = request
        .generated_images
        .iter()
        .map(|raw| ImageSource::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let draft = RecordDraft {
        original,
        generated,
        parameters: request.parameters,
        ingredients: request.ingredients,
        seed: request.seed.unwrap_or_else(new_seed),
    };
    let id = persist(&data, draft).await?;

    Ok(HttpResponse::Created().json(SaveRecordResponse { id }))
}

pub async fn get_history(
    query: web::Query<HistoryQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let records = data
        .records
        .as_ref()
        .ok_or(GourmetError::NotConfigured("record store"))?;

    let max_records = query
        .max_records
        .unwrap_or(DEFAULT_HISTORY_RECORDS)
        .clamp(1, MAX_HISTORY_RECORDS);
    let entries = records.list_recent(max_records).await?;
    info!("Returning {} history record(s)", entries.len());

    Ok(HttpResponse::Ok().json(serde_json::json!({ "records": entries })))
}

async fn persist(data: &AppState, draft: RecordDraft) -> Result<String, GourmetError> {
    let records = data
        .records
        .as_deref()
        .ok_or(GourmetError::NotConfigured("record store"))?;
    save_generation(records, data.media.as_deref(), draft).await
}
