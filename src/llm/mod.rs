// llm/mod.rs - Completion adapter trait + shared wire helpers

pub mod gemini;
pub mod openrouter;
mod types;

pub use gemini::GeminiAdapter;
pub use openrouter::OpenRouterAdapter;
pub use types::{
    FailureKind, GenerationFailure, GenerationRequest, GenerationResult, ProviderId,
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE,
};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Trait for hosted text generation adapters
#[async_trait]
pub trait CompletionAdapter: Send + Sync {
    /// Generate text for one request. No retries happen inside an adapter.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationFailure>;

    /// Which provider this adapter talks to
    fn provider(&self) -> ProviderId;
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

/// Error object shape shared closely enough by both providers
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ApiErrorBody {
    pub fn describe(&self) -> String {
        let message = self.message.as_deref().unwrap_or("unknown error");
        match self.status.as_deref() {
            Some(status) if !status.is_empty() => format!("{} ({})", message, status),
            _ => message.to_string(),
        }
    }
}

/// Map a non-success HTTP response to a failure, keeping the provider's own wording
pub(crate) fn http_failure(
    provider: ProviderId,
    label: &str,
    status: StatusCode,
    body: &str,
) -> GenerationFailure {
    let detail = match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.describe(),
        Err(_) => match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value) => value.to_string(),
            Err(_) if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string(),
            Err(_) => body.trim().to_string(),
        },
    };

    GenerationFailure::transport(
        provider,
        format!("{} API error {}: {}", label, status.as_u16(), detail),
    )
    .with_status(status.as_u16())
}

/// Parse an already-read success body; never assumes the content type
pub(crate) fn parse_body<T: DeserializeOwned>(
    provider: ProviderId,
    label: &str,
    body: &str,
) -> Result<T, GenerationFailure> {
    serde_json::from_str(body).map_err(|e| {
        tracing::debug!("{} raw response: {}", label, body);
        GenerationFailure::invalid_response(
            provider,
            format!("Invalid JSON response from {} API: {}", label, e),
        )
    })
}

/// Ensure the adapter has a usable key before building any request
pub(crate) fn require_key<'a>(
    provider: ProviderId,
    label: &str,
    api_key: &'a str,
) -> Result<&'a str, GenerationFailure> {
    let key = api_key.trim();
    if key.is_empty() {
        return Err(GenerationFailure::config(
            provider,
            format!("{} API key is missing. Please add it in the settings.", label),
        ));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_failure_prefers_structured_error() {
        let body = r#"{"error":{"code":429,"message":"You exceeded your current quota","status":"RESOURCE_EXHAUSTED"}}"#;
        let failure = http_failure(ProviderId::Gemini, "Gemini", StatusCode::TOO_MANY_REQUESTS, body);

        assert_eq!(failure.kind, FailureKind::TransportError);
        assert_eq!(failure.status, Some(429));
        assert_eq!(
            failure.message,
            "Gemini API error 429: You exceeded your current quota (RESOURCE_EXHAUSTED)"
        );
    }

    #[test]
    fn test_http_failure_falls_back_to_raw_body() {
        let failure = http_failure(
            ProviderId::OpenRouter,
            "OpenRouter",
            StatusCode::BAD_GATEWAY,
            "<html>upstream down</html>",
        );
        assert_eq!(failure.message, "OpenRouter API error 502: <html>upstream down</html>");

        let empty = http_failure(ProviderId::OpenRouter, "OpenRouter", StatusCode::BAD_GATEWAY, "");
        assert_eq!(empty.message, "OpenRouter API error 502: Bad Gateway");
    }

    #[test]
    fn test_parse_body_reports_invalid_response() {
        let err = parse_body::<serde_json::Value>(ProviderId::Gemini, "Gemini", "not json").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidResponse);
    }

    #[test]
    fn test_require_key_rejects_blank() {
        let err = require_key(ProviderId::OpenRouter, "OpenRouter", "  ").unwrap_err();
        assert_eq!(err.kind, FailureKind::ConfigError);
        assert_eq!(require_key(ProviderId::OpenRouter, "OpenRouter", " k ").unwrap(), "k");
    }
}
