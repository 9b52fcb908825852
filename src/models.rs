// src/models.rs
use crate::errors::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Style choices for one generation request. Single-valued fields are
/// optional so a missing required field can be reported instead of
/// silently defaulted; multi-select fields are ordered sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParameters {
    #[serde(
        default,
        deserialize_with = "lenient_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub intensity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_angle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dishware_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dishware_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_of_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steam_effect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness_effect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_texture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_direction: Option<String>,
    #[serde(default, deserialize_with = "string_set", skip_serializing_if = "Vec::is_empty")]
    pub extra_decorations: Vec<String>,
    #[serde(default, deserialize_with = "string_set", skip_serializing_if = "Vec::is_empty")]
    pub props: Vec<String>,
    #[serde(default, deserialize_with = "string_set", skip_serializing_if = "Vec::is_empty")]
    pub cuisine_type: Vec<String>,
    #[serde(default, deserialize_with = "string_set", skip_serializing_if = "Vec::is_empty")]
    pub dish_category: Vec<String>,
    #[serde(default, deserialize_with = "string_set", skip_serializing_if = "Vec::is_empty")]
    pub cooking_technique: Vec<String>,
    #[serde(default, deserialize_with = "string_set", skip_serializing_if = "Vec::is_empty")]
    pub culinary_tags: Vec<String>,
}

impl GenerationParameters {
    pub const MIN_INTENSITY: i64 = 1;
    pub const MAX_INTENSITY: i64 = 10;

    /// The state a fresh UI session starts from.
    pub fn session_defaults() -> Self {
        Self {
            intensity: Some(5),
            style: Some("moderno".to_string()),
            lighting: Some("natural".to_string()),
            background: Some("blanco".to_string()),
            camera_angle: Some("45".to_string()),
            ..Self::default()
        }
    }

    /// Presence and range check run before any external call. Enum values
    /// are not checked here; unknown ones are rendered verbatim later.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let Some(intensity) = self.intensity else {
            return Err(ValidationError::MissingField("intensity"));
        };
        let required = [
            ("style", &self.style),
            ("lighting", &self.lighting),
            ("background", &self.background),
            ("cameraAngle", &self.camera_angle),
        ];
        for (name, value) in required {
            if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
                return Err(ValidationError::MissingField(name));
            }
        }
        if !(Self::MIN_INTENSITY..=Self::MAX_INTENSITY).contains(&intensity) {
            return Err(ValidationError::OutOfRange {
                field: "intensity",
                value: intensity,
            });
        }
        Ok(())
    }
}

/// Accepts a set, a legacy single string, or null. Blank members are
/// dropped and duplicates removed keeping first-seen order.
fn string_set<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let values = match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    };

    let mut set: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim().to_string();
        if !value.is_empty() && !set.contains(&value) {
            set.push(value);
        }
    }
    Ok(set)
}

/// Older clients sent the intensity slider value as a string.
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(i64),
        Text(String),
    }

    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid intensity: {text}"))),
    }
}

/// One persisted unit of generation output. Images are referenced by
/// their hosted URL, never embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub original_image_url: Option<String>,
    pub generated_image_urls: Vec<String>,
    pub parameters: GenerationParameters,
    pub summary: String,
    pub seed: u32,
    pub ingredients: String,
    pub ingredient_category: String,
    pub created_at: DateTime<Utc>,
}

/// A record read back from the store, with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    #[serde(flatten)]
    pub record: GenerationRecord,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientAnalysis {
    pub ingredients: String,
    pub ingredient_category: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Generated image as a `data:` URI.
    pub generated_image: String,
    pub model: String,
    pub ingredients: String,
    pub ingredient_category: String,
    pub summary: String,
    pub seed: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScratchRequest {
    pub idea: String,
    #[serde(default)]
    pub parameters: GenerationParameters,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    #[serde(default)]
    pub idea: Option<String>,
    #[serde(default)]
    pub parameters: GenerationParameters,
    #[serde(default)]
    pub ingredients: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeResponse {
    pub recipe: String,
    pub model: String,
}

/// Images arrive as `data:` URIs, bare base64, or already-hosted URLs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecordRequest {
    #[serde(default)]
    pub original_image: Option<String>,
    pub generated_images: Vec<String>,
    #[serde(default)]
    pub parameters: GenerationParameters,
    #[serde(default)]
    pub ingredients: String,
    #[serde(default)]
    pub seed: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveRecordResponse {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub max_records: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_defaults_are_valid() {
        assert_eq!(GenerationParameters::session_defaults().validate(), Ok(()));
    }

    #[test]
    fn intensity_out_of_range_is_rejected() {
        for value in [-3, 0, 11, 100] {
            let params = GenerationParameters {
                intensity: Some(value),
                ..GenerationParameters::session_defaults()
            };
            assert_eq!(
                params.validate(),
                Err(ValidationError::OutOfRange {
                    field: "intensity",
                    value
                })
            );
        }
    }

    #[test]
    fn missing_required_fields_are_reported_in_order() {
        assert_eq!(
            GenerationParameters::default().validate(),
            Err(ValidationError::MissingField("intensity"))
        );
        let params = GenerationParameters {
            camera_angle: None,
            ..GenerationParameters::session_defaults()
        };
        assert_eq!(
            params.validate(),
            Err(ValidationError::MissingField("cameraAngle"))
        );
        let params = GenerationParameters {
            style: Some("   ".to_string()),
            ..GenerationParameters::session_defaults()
        };
        assert_eq!(params.validate(), Err(ValidationError::MissingField("style")));
    }

    #[test]
    fn unknown_enum_values_are_accepted() {
        let params = GenerationParameters {
            style: Some("cyberpunk".to_string()),
            ambience: Some("luna".to_string()),
            ..GenerationParameters::session_defaults()
        };
        assert_eq!(params.validate(), Ok(()));
    }

    #[test]
    fn legacy_single_strings_become_sets() {
        let params: GenerationParameters = serde_json::from_value(json!({
            "intensity": "7",
            "style": "rustico",
            "props": "cubiertos",
            "cuisineType": null,
            "culinaryTags": ["vegano", "vegano", " ", "picante"],
        }))
        .unwrap();
        assert_eq!(params.intensity, Some(7));
        assert_eq!(params.props, vec!["cubiertos"]);
        assert!(params.cuisine_type.is_empty());
        assert_eq!(params.culinary_tags, vec!["vegano", "picante"]);
    }

    #[test]
    fn parameters_survive_a_json_round_trip() {
        let params = GenerationParameters {
            ambience: Some("terraza".to_string()),
            extra_decorations: vec!["salsa".to_string(), "hierbas".to_string()],
            cooking_technique: vec!["horneado".to_string()],
            ..GenerationParameters::session_defaults()
        };
        let blob = serde_json::to_string(&params).unwrap();
        assert!(blob.contains("\"cameraAngle\":\"45\""));
        let parsed: GenerationParameters = serde_json::from_str(&blob).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn non_numeric_intensity_fails_to_parse() {
        let parsed = serde_json::from_value::<GenerationParameters>(json!({ "intensity": "alta" }));
        assert!(parsed.is_err());
    }
}
