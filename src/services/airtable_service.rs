// src/services/airtable_service.rs
use crate::config::AirtableConfig;
use crate::errors::GourmetError;
use crate::fallback::{ErrorKind, UpstreamError};
use crate::models::{GenerationParameters, GenerationRecord, HistoryEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use reqwest::{Client, Url};
use serde_json::{Value, json};
use std::time::Duration;

pub const FIELD_ORIGINAL_IMAGE: &str = "Imagen Original";
pub const FIELD_GENERATED_IMAGES: &str = "Imagen Generada";
pub const FIELD_PARAMETERS: &str = "Parametros";
pub const FIELD_SUMMARY: &str = "Descripcion";
pub const FIELD_SEED: &str = "Semilla";
pub const FIELD_INGREDIENTS: &str = "Ingredientes";
pub const FIELD_CATEGORY: &str = "Categoria";
pub const FIELD_CREATED_AT: &str = "Fecha";

/// Append-only store of generation records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a record, returning the store-assigned id.
    async fn create(&self, record: &GenerationRecord) -> Result<String, GourmetError>;

    /// Most recent records first, at most `max_records`.
    async fn list_recent(&self, max_records: u32) -> Result<Vec<HistoryEntry>, GourmetError>;
}

pub struct AirtableStore {
    config: AirtableConfig,
    timeout: Duration,
    client: Client,
}

impl AirtableStore {
    pub fn new(config: AirtableConfig, timeout: Duration) -> Self {
        Self {
            config,
            timeout,
            client: Client::new(),
        }
    }

    fn table_url(&self) -> Result<Url, GourmetError> {
        let mut url = Url::parse(&self.config.base_url).map_err(|e| {
            GourmetError::Persistence(format!("Invalid Airtable base URL: {}", e))
        })?;
        url.path_segments_mut()
            .map_err(|_| GourmetError::Persistence("Invalid Airtable base URL".to_string()))?
            .pop_if_empty()
            .push(&self.config.base_id)
            .push(&self.config.table);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, GourmetError> {
        let response = request
            .bearer_auth(&self.config.api_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| store_error(UpstreamError::from_reqwest(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| store_error(UpstreamError::from_reqwest(&e)))?;
        if !status.is_success() {
            return Err(store_error(UpstreamError::from_response(status.as_u16(), &body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| GourmetError::Persistence(format!("Failed to parse Airtable response: {}", e)))
    }
}

#[async_trait]
impl RecordStore for AirtableStore {
    async fn create(&self, record: &GenerationRecord) -> Result<String, GourmetError> {
        let url = self.table_url()?;
        let body = json!({ "records": [{ "fields": to_fields(record)? }] });
        let created = self.send(self.client.post(url).json(&body)).await?;

        created["records"][0]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| GourmetError::Persistence("No record id in Airtable response".to_string()))
    }

    async fn list_recent(&self, max_records: u32) -> Result<Vec<HistoryEntry>, GourmetError> {
        let url = self.table_url()?;
        let max_records = max_records.to_string();
        let request = self.client.get(url).query(&[
            ("maxRecords", max_records.as_str()),
            ("sort[0][field]", FIELD_CREATED_AT),
            ("sort[0][direction]", "desc"),
        ]);
        let listing = self.send(request).await?;

        Ok(listing["records"]
            .as_array()
            .map(|records| records.iter().filter_map(from_airtable).collect())
            .unwrap_or_default())
    }
}

fn store_error(error: UpstreamError) -> GourmetError {
    match error.kind {
        ErrorKind::AuthDenied => GourmetError::Auth(format!("Airtable: {error}")),
        ErrorKind::Timeout => GourmetError::Timeout(format!("Airtable: {error}")),
        _ => GourmetError::Persistence(error.message),
    }
}

/// Airtable field map for a record. Parameters are stored as a JSON blob.
pub fn to_fields(record: &GenerationRecord) -> Result<Value, GourmetError> {
    let parameters = serde_json::to_string(&record.parameters).map_err(|e| {
        GourmetError::Persistence(format!("Failed to serialize parameters: {}", e))
    })?;

    let mut fields = json!({
        FIELD_GENERATED_IMAGES: record
            .generated_image_urls
            .iter()
            .map(|url| json!({ "url": url }))
            .collect::<Vec<_>>(),
        FIELD_PARAMETERS: parameters,
        FIELD_SUMMARY: record.summary,
        FIELD_SEED: record.seed,
        FIELD_INGREDIENTS: record.ingredients,
        FIELD_CATEGORY: record.ingredient_category,
        FIELD_CREATED_AT: record.created_at.to_rfc3339(),
    });
    if let Some(url) = &record.original_image_url {
        fields[FIELD_ORIGINAL_IMAGE] = json!([{ "url": url }]);
    }
    Ok(fields)
}

/// Parse one stored record. Missing fields fall back to empty values;
/// records without an id are skipped.
pub fn from_airtable(record: &Value) -> Option<HistoryEntry> {
    let id = record["id"].as_str()?.to_string();
    let fields = &record["fields"];

    let attachment_urls = |field: &str| -> Vec<String> {
        fields[field]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item["url"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    };
    let text = |field: &str| fields[field].as_str().unwrap_or_default().to_string();

    let parameters = match fields[FIELD_PARAMETERS].as_str() {
        Some(blob) => serde_json::from_str::<GenerationParameters>(blob).unwrap_or_else(|e| {
            warn!("Record {id} has unreadable parameters: {e}");
            GenerationParameters::default()
        }),
        None => GenerationParameters::default(),
    };

    let created_at = [fields[FIELD_CREATED_AT].as_str(), record["createdTime"].as_str()]
        .into_iter()
        .flatten()
        .find_map(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_default();

    Some(HistoryEntry {
        id,
        record: GenerationRecord {
            original_image_url: attachment_urls(FIELD_ORIGINAL_IMAGE).into_iter().next(),
            generated_image_urls: attachment_urls(FIELD_GENERATED_IMAGES),
            parameters,
            summary: text(FIELD_SUMMARY),
            seed: fields[FIELD_SEED]
                .as_u64()
                .and_then(|s| u32::try_from(s).ok())
                .unwrap_or_default(),
            ingredients: text(FIELD_INGREDIENTS),
            ingredient_category: text(FIELD_CATEGORY),
            created_at,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> GenerationRecord {
        GenerationRecord {
            original_image_url: Some("https://i.imgur.com/orig.jpg".to_string()),
            generated_image_urls: vec!["https://i.imgur.com/gen.png".to_string()],
            parameters: GenerationParameters {
                props: vec!["cubiertos".to_string()],
                ..GenerationParameters::session_defaults()
            },
            summary: "estilo moderno".to_string(),
            seed: 424242,
            ingredients: "tomate, mozzarella".to_string(),
            ingredient_category: "vegetales, lacteos".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn fields_use_attachments_and_a_parameter_blob() {
        let fields = to_fields(&record()).unwrap();
        assert_eq!(fields[FIELD_ORIGINAL_IMAGE][0]["url"], "https://i.imgur.com/orig.jpg");
        assert_eq!(fields[FIELD_GENERATED_IMAGES][0]["url"], "https://i.imgur.com/gen.png");
        assert_eq!(fields[FIELD_SEED], 424242);
        let blob = fields[FIELD_PARAMETERS].as_str().unwrap();
        assert!(blob.contains("\"props\":[\"cubiertos\"]"));
    }

    #[test]
    fn stored_records_read_back_unchanged() {
        let original = record();
        let stored = json!({
            "id": "rec123",
            "createdTime": "2025-03-01T12:00:05.000Z",
            "fields": to_fields(&original).unwrap()
        });
        let entry = from_airtable(&stored).unwrap();
        assert_eq!(entry.id, "rec123");
        assert_eq!(entry.record, original);
    }

    #[test]
    fn legacy_parameter_blobs_are_normalized() {
        let stored = json!({
            "id": "recOld",
            "createdTime": "2024-01-01T00:00:00.000Z",
            "fields": {
                FIELD_PARAMETERS: r#"{"intensity":5,"style":"rustico","props":"servilleta","cuisineType":"italiana"}"#
            }
        });
        let entry = from_airtable(&stored).unwrap();
        assert_eq!(entry.record.parameters.props, vec!["servilleta"]);
        assert_eq!(entry.record.parameters.cuisine_type, vec!["italiana"]);
        assert_eq!(entry.record.original_image_url, None);
        assert_eq!(
            entry.record.created_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn records_without_id_are_skipped() {
        assert!(from_airtable(&json!({ "fields": {} })).is_none());
    }

    #[test]
    fn table_url_encodes_the_table_name() {
        let store = AirtableStore::new(
            AirtableConfig {
                api_key: "key".to_string(),
                base_id: "appXYZ".to_string(),
                table: "Mis Generaciones".to_string(),
                base_url: "https://api.airtable.com/v0".to_string(),
            },
            Duration::from_secs(5),
        );
        assert_eq!(
            store.table_url().unwrap().as_str(),
            "https://api.airtable.com/v0/appXYZ/Mis%20Generaciones"
        );
    }

    #[test]
    fn store_validation_errors_are_kept_verbatim() {
        let err = store_error(UpstreamError::from_response(
            422,
            r#"{"error":{"type":"UNKNOWN_FIELD_NAME","message":"Unknown field name: \"Semilla\""}}"#,
        ));
        assert_eq!(err.user_message(), "Unknown field name: \"Semilla\"");
    }
}
