// src/fallback.rs
//! Candidate model ordering and sequential first-success invocation.

use crate::errors::GourmetError;
use crate::extract::excerpt;
use log::{error, info, warn};
use std::fmt;
use std::future::Future;

/// How an upstream failure should steer the fallback loop. Classified once,
/// where the raw HTTP error is first seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AuthDenied,
    RateLimited,
    Timeout,
    Transient,
    /// The call succeeded but carried nothing usable.
    EmptyPayload,
    Unknown,
}

/// What a fallback chain is trying to obtain, for logs and user messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ImageGeneration,
    IngredientDetection,
    Recipe,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::ImageGeneration => "image generation",
            Capability::IngredientDetection => "ingredient detection",
            Capability::Recipe => "recipe generation",
        }
    }

    /// What the extractor looks for in a response.
    pub fn payload(self) -> &'static str {
        match self {
            Capability::ImageGeneration => "image",
            Capability::IngredientDetection | Capability::Recipe => "text",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorKind {
    pub fn classify(status: Option<u16>, message: &str) -> Self {
        match status {
            Some(401 | 403) => return ErrorKind::AuthDenied,
            Some(404) => return ErrorKind::NotFound,
            Some(408) => return ErrorKind::Timeout,
            Some(429) => return ErrorKind::RateLimited,
            Some(500..=599) => return ErrorKind::Transient,
            _ => {}
        }

        let message = message.to_lowercase();
        if mentions_not_found(&message) {
            ErrorKind::NotFound
        } else if message.contains("api key not valid")
            || message.contains("permission_denied")
            || message.contains("unauthenticated")
        {
            ErrorKind::AuthDenied
        } else if message.contains("resource_exhausted") || message.contains("rate limit") {
            ErrorKind::RateLimited
        } else {
            ErrorKind::Unknown
        }
    }

    /// Only credential failures stop the loop; anything else might be
    /// specific to one model.
    pub fn is_fatal(self) -> bool {
        self == ErrorKind::AuthDenied
    }
}

fn mentions_not_found(message: &str) -> bool {
    message.contains("not found") || message.contains("404")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: ErrorKind::classify(status, &message),
            status,
            message,
        }
    }

    pub fn with_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    /// Build from a non-success HTTP response, preferring the JSON
    /// `error.message` field Google, Anthropic and Airtable all use.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v["error"]["message"]
                    .as_str()
                    .or_else(|| v["error"].as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| excerpt(body, 500));
        Self::new(Some(status), message)
    }

    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        if err.is_timeout() {
            return Self {
                kind: ErrorKind::Timeout,
                status,
                message: err.to_string(),
            };
        }
        if err.is_connect() {
            return Self {
                kind: ErrorKind::Transient,
                status,
                message: err.to_string(),
            };
        }
        Self::new(status, err.to_string())
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "[{:?} {}] {}", self.kind, status, self.message),
            None => write!(f, "[{:?}] {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for UpstreamError {}

/// Ordered list of models to try for one request.
///
/// Without a usable availability list the static preference order is
/// returned unchanged. Otherwise only available models are returned,
/// preferred family first, each group in availability order.
pub fn resolve_candidates<F>(
    static_preference: &[String],
    available: Option<&[String]>,
    is_preferred: F,
) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    let available = match available {
        Some(models) if !models.is_empty() => models,
        _ => return static_preference.to_vec(),
    };

    let (preferred, rest): (Vec<&String>, Vec<&String>) =
        available.iter().partition(|m| is_preferred(m));

    let mut candidates: Vec<String> = Vec::with_capacity(available.len());
    for model in preferred.into_iter().chain(rest) {
        if !candidates.contains(model) {
            candidates.push(model.clone());
        }
    }
    candidates
}

/// A successful call and the model that served it.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt<T> {
    pub model: String,
    pub value: T,
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackError {
    /// A credential failure; remaining candidates were not tried.
    Fatal { model: String, error: UpstreamError },
    /// Every candidate failed. `last` is `None` only for an empty list.
    Exhausted {
        last: Option<UpstreamError>,
        attempts: usize,
    },
}

impl FallbackError {
    /// Whether the failure reads as "no model exists for this key".
    pub fn models_unavailable(&self) -> bool {
        match self {
            FallbackError::Fatal { .. } => false,
            FallbackError::Exhausted { last: None, .. } => true,
            FallbackError::Exhausted {
                last: Some(error), ..
            } => {
                error.kind == ErrorKind::NotFound
                    || mentions_not_found(&error.message.to_lowercase())
            }
        }
    }

    pub fn into_gourmet(self, capability: Capability) -> GourmetError {
        let unavailable = self.models_unavailable();
        match self {
            FallbackError::Fatal { model, error } => {
                GourmetError::Auth(format!("{model}: {error}"))
            }
            FallbackError::Exhausted { last, attempts } => {
                let detail = match &last {
                    Some(error) => format!("{attempts} candidate(s) failed, last: {error}"),
                    None => "no candidate models".to_string(),
                };
                if unavailable {
                    return GourmetError::ModelUnavailable { capability, detail };
                }
                match last.map(|e| e.kind) {
                    Some(ErrorKind::Timeout) => GourmetError::Timeout(detail),
                    Some(ErrorKind::EmptyPayload) => GourmetError::Extraction(capability),
                    Some(ErrorKind::RateLimited | ErrorKind::Transient) => {
                        GourmetError::UpstreamTransient(detail)
                    }
                    _ => GourmetError::Upstream(detail),
                }
            }
        }
    }
}

/// Call `call` for each candidate in order until one succeeds.
///
/// Attempts are strictly sequential. A credential failure aborts at once;
/// every other failure moves on to the next candidate.
pub async fn invoke_with_fallback<T, F, Fut>(
    stage: &str,
    candidates: &[String],
    mut call: F,
) -> Result<Attempt<T>, FallbackError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut last = None;

    for (index, model) in candidates.iter().enumerate() {
        info!("{stage}: trying model {model} ({}/{})", index + 1, candidates.len());
        match call(model.clone()).await {
            Ok(value) => {
                info!("{stage}: model {model} succeeded");
                return Ok(Attempt {
                    model: model.clone(),
                    value,
                    attempts: index + 1,
                });
            }
            Err(error) if error.kind.is_fatal() => {
                return Err(FallbackError::Fatal {
                    model: model.clone(),
                    error,
                });
            }
            Err(error) => {
                warn!("{stage}: model {model} failed: {error}");
                last = Some(error);
            }
        }
    }

    Err(FallbackError::Exhausted {
        last,
        attempts: candidates.len(),
    })
}

/// Log the outcome of a fallback chain and map failures to the
/// user-facing taxonomy. Credential failures are expected and not logged
/// as errors.
pub fn conclude<T>(
    capability: Capability,
    result: Result<Attempt<T>, FallbackError>,
) -> Result<Attempt<T>, GourmetError> {
    match result {
        Ok(attempt) => {
            info!(
                "{capability} served by {} after {} attempt(s)",
                attempt.model, attempt.attempts
            );
            Ok(attempt)
        }
        Err(e @ FallbackError::Fatal { .. }) => {
            info!("{capability} rejected credentials: {e:?}");
            Err(e.into_gourmet(capability))
        }
        Err(e) => {
            error!("{capability} failed on every candidate: {e:?}");
            Err(e.into_gourmet(capability))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn missing_availability_keeps_static_order() {
        let fallback = list(&["a", "b", "c"]);
        assert_eq!(resolve_candidates(&fallback, None, |_| true), fallback);
        assert_eq!(resolve_candidates(&fallback, Some(&[][..]), |_| true), fallback);
    }

    #[test]
    fn preferred_family_comes_first_in_availability_order() {
        let fallback = list(&["a", "b", "c"]);
        let available = list(&["c", "a"]);
        assert_eq!(
            resolve_candidates(&fallback, Some(available.as_slice()), |m| m == "a"),
            list(&["a", "c"])
        );

        let available = list(&["x-text", "y-image", "z-text", "w-image", "y-image"]);
        assert_eq!(
            resolve_candidates(&fallback, Some(available.as_slice()), |m| m.contains("image")),
            list(&["y-image", "w-image", "x-text", "z-text"])
        );
    }

    #[test]
    fn unavailable_static_models_are_never_added() {
        let fallback = list(&["gemini-a", "gemini-b"]);
        let available = list(&["gemini-c"]);
        assert_eq!(
            resolve_candidates(&fallback, Some(available.as_slice()), |_| false),
            list(&["gemini-c"])
        );
    }

    #[test]
    fn classification_prefers_status_over_text() {
        assert_eq!(ErrorKind::classify(Some(403), "not found"), ErrorKind::AuthDenied);
        assert_eq!(ErrorKind::classify(Some(401), ""), ErrorKind::AuthDenied);
        assert_eq!(ErrorKind::classify(Some(404), ""), ErrorKind::NotFound);
        assert_eq!(ErrorKind::classify(Some(429), ""), ErrorKind::RateLimited);
        assert_eq!(ErrorKind::classify(Some(503), ""), ErrorKind::Transient);
        assert_eq!(
            ErrorKind::classify(None, "models/foo is not found for API version v1beta"),
            ErrorKind::NotFound
        );
        assert_eq!(
            ErrorKind::classify(Some(400), "API key not valid. Please pass a valid API key."),
            ErrorKind::AuthDenied
        );
        assert_eq!(ErrorKind::classify(Some(400), "bad request"), ErrorKind::Unknown);
    }

    #[test]
    fn response_bodies_prefer_the_json_error_message() {
        let body = r#"{"error":{"code":404,"message":"models/x is not found for API version v1beta","status":"NOT_FOUND"}}"#;
        let err = UpstreamError::from_response(404, body);
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "models/x is not found for API version v1beta");

        let err = UpstreamError::from_response(502, "<html>bad gateway</html>");
        assert_eq!(err.kind, ErrorKind::Transient);
        assert_eq!(err.message, "<html>bad gateway</html>");
    }

    #[tokio::test]
    async fn third_candidate_wins_after_two_not_found() {
        let candidates = list(&["m1", "m2", "m3", "m4"]);
        let calls = RefCell::new(Vec::new());

        let result = invoke_with_fallback("test", &candidates, |model| {
            calls.borrow_mut().push(model.clone());
            async move {
                match model.as_str() {
                    "m1" | "m2" => Err(UpstreamError::new(Some(404), "model not found")),
                    _ => Ok(format!("image from {model}")),
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result.model, "m3");
        assert_eq!(result.value, "image from m3");
        assert_eq!(result.attempts, 3);
        assert_eq!(*calls.borrow(), list(&["m1", "m2", "m3"]));
    }

    #[tokio::test]
    async fn auth_failure_short_circuits() {
        let candidates = list(&["m1", "m2"]);
        let calls = RefCell::new(0);

        let result: Result<Attempt<()>, _> = invoke_with_fallback("test", &candidates, |_| {
            *calls.borrow_mut() += 1;
            async { Err(UpstreamError::new(Some(403), "forbidden")) }
        })
        .await;

        assert!(matches!(result, Err(FallbackError::Fatal { ref model, .. }) if model == "m1"));
        assert_eq!(*calls.borrow(), 1);
        assert!(matches!(
            result.unwrap_err().into_gourmet(Capability::ImageGeneration),
            GourmetError::Auth(_)
        ));
    }

    #[tokio::test]
    async fn transient_failures_move_on_to_the_next_candidate() {
        let candidates = list(&["m1", "m2"]);
        let result = invoke_with_fallback("test", &candidates, |model| async move {
            if model == "m1" {
                Err(UpstreamError::new(Some(500), "internal"))
            } else {
                Ok(42)
            }
        })
        .await
        .unwrap();
        assert_eq!(result.model, "m2");
        assert_eq!(result.value, 42);
    }

    #[tokio::test]
    async fn exhaustion_distinguishes_unavailable_models() {
        let candidates = list(&["m1", "m2"]);
        let err = invoke_with_fallback("test", &candidates, |_| async {
            Err::<(), _>(UpstreamError::new(Some(404), "not found"))
        })
        .await
        .unwrap_err();
        assert!(err.models_unavailable());
        assert!(matches!(
            err.into_gourmet(Capability::ImageGeneration),
            GourmetError::ModelUnavailable { .. }
        ));

        let err = invoke_with_fallback("test", &candidates, |_| async {
            Err::<(), _>(UpstreamError::with_kind(ErrorKind::Timeout, "deadline"))
        })
        .await
        .unwrap_err();
        assert!(!err.models_unavailable());
        assert!(matches!(
            err.into_gourmet(Capability::ImageGeneration),
            GourmetError::Timeout(_)
        ));
    }

    #[tokio::test]
    async fn empty_candidate_list_is_exhausted() {
        let err = invoke_with_fallback("test", &[], |_| async { Ok::<_, UpstreamError>(()) })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FallbackError::Exhausted {
                last: None,
                attempts: 0
            }
        );
    }
}
