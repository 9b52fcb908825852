// src/errors.rs
use crate::fallback::Capability;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required parameter: {0}")]
    MissingField(&'static str),

    #[error("parameter {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
}

#[derive(Error, Debug)]
pub enum GourmetError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Upstream rejected credentials: {0}")]
    Auth(String),

    #[error("No {capability} model available: {detail}")]
    ModelUnavailable {
        capability: Capability,
        detail: String,
    },

    #[error("Could not extract payload from {0} response")]
    Extraction(Capability),

    #[error("Upstream request timed out: {0}")]
    Timeout(String),

    #[error("Upstream temporarily unavailable: {0}")]
    UpstreamTransient(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl GourmetError {
    /// The fixed message shown to clients. Upstream detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            GourmetError::Validation(e) => e.to_string(),
            GourmetError::BadRequest(msg) => msg.clone(),
            GourmetError::ImageProcessing(msg) => msg.clone(),
            GourmetError::Auth(_) => "invalid credentials".to_string(),
            GourmetError::ModelUnavailable { capability, .. } => format!(
                "none of the models available for this API key support {capability}"
            ),
            GourmetError::Extraction(capability) => {
                format!("could not extract {} from response", capability.payload())
            }
            GourmetError::Timeout(_) => "request timed out".to_string(),
            GourmetError::UpstreamTransient(_) => {
                "service temporarily unavailable, try again later".to_string()
            }
            GourmetError::Upstream(_) => "generation failed".to_string(),
            // The store's validation text is what tells the operator which
            // field name or shape it refused.
            GourmetError::Persistence(msg) => msg.clone(),
            GourmetError::NotConfigured(what) => format!("{what} is not configured"),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            GourmetError::Validation(_) => "Validation error",
            GourmetError::BadRequest(_) => "Bad request",
            GourmetError::ImageProcessing(_) => "Image processing error",
            GourmetError::Auth(_) => "Authentication error",
            GourmetError::ModelUnavailable { .. } => "Model unavailable",
            GourmetError::Extraction(_) => "Response shape unrecognized",
            GourmetError::Timeout(_) => "Timeout",
            GourmetError::UpstreamTransient(_) => "Service unavailable",
            GourmetError::Upstream(_) => "AI service error",
            GourmetError::Persistence(_) => "Persistence error",
            GourmetError::NotConfigured(_) => "Not configured",
        }
    }
}

impl ResponseError for GourmetError {
    fn status_code(&self) -> StatusCode {
        match self {
            GourmetError::Validation(_)
            | GourmetError::BadRequest(_)
            | GourmetError::ImageProcessing(_) => StatusCode::BAD_REQUEST,
            GourmetError::Auth(_) => StatusCode::UNAUTHORIZED,
            GourmetError::ModelUnavailable { .. }
            | GourmetError::UpstreamTransient(_)
            | GourmetError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            GourmetError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GourmetError::Extraction(_)
            | GourmetError::Upstream(_)
            | GourmetError::Persistence(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.label(),
            "message": self.user_message()
        }))
    }
}
