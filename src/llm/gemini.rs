// llm/gemini.rs - Google Gemini adapter (primary provider)

use super::{
    http_failure, parse_body, require_key, CompletionAdapter, GenerationFailure,
    GenerationRequest, GenerationResult, ProviderId,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const LABEL: &str = "Gemini";
const NORMAL_FINISH_REASONS: &[&str] = &["STOP", "MAX_TOKENS", "FINISH_REASON_UNSPECIFIED"];
const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

pub struct GeminiAdapter {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiAdapter {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_options(api_key, model, DEFAULT_BASE_URL.to_string(), None)
    }

    pub fn with_options(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Option<Duration>,
    ) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_default();

        Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Older 1.0 models live under `v1`; 1.5 and 2.x are served from `v1beta`
    fn api_version(model: &str) -> &'static str {
        if model.starts_with("gemini-1.5") || model.starts_with("gemini-2") {
            "v1beta"
        } else {
            "v1"
        }
    }

    fn endpoint(&self, model: &str, api_key: &str) -> String {
        format!(
            "{}/{}/models/{}:generateContent?key={}",
            self.base_url,
            Self::api_version(model),
            model,
            api_key
        )
    }

    fn build_payload(request: &GenerationRequest) -> GeminiRequest {
        let mut parts = Vec::with_capacity(2);
        if let Some(system_prompt) = request.system_prompt() {
            parts.push(Part {
                text: system_prompt.to_string(),
            });
        }
        parts.push(Part {
            text: request.prompt.clone(),
        });

        GeminiRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        }
    }

    fn interpret_response(status: StatusCode, body: &str) -> Result<String, GenerationFailure> {
        let provider = ProviderId::Gemini;

        if !status.is_success() {
            let failure = http_failure(provider, LABEL, status, body);
            tracing::error!("{}", failure.message);
            return Err(failure);
        }

        let response: GeminiResponse = parse_body(provider, LABEL, body)?;

        let candidate = response.candidates.first().ok_or_else(|| {
            GenerationFailure::empty_content(provider, "No content generated from Gemini")
        })?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if !NORMAL_FINISH_REASONS.iter().any(|normal| *normal == reason) {
                tracing::warn!("Gemini content blocked due to: {}", reason);
                return Err(GenerationFailure::content_blocked(provider, reason));
            }
        }

        candidate
            .content
            .as_ref()
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                GenerationFailure::empty_content(provider, "Empty content received from Gemini")
            })
    }
}

#[async_trait]
impl CompletionAdapter for GeminiAdapter {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationFailure> {
        let provider = self.provider();
        request.validate(provider)?;
        let api_key = require_key(provider, LABEL, &self.api_key)?;

        let model = request.model.as_deref().unwrap_or(&self.model);
        let payload = Self::build_payload(request);

        tracing::debug!(
            "Gemini payload: model={}, temperature={}, max_output_tokens={}, system_prompt={}",
            model,
            request.temperature,
            request.max_output_tokens,
            request.system_prompt().is_some()
        );

        let response = self
            .client
            .post(self.endpoint(model, api_key))
            .json(&payload)
            .send()
            .await
            // The request URL carries the API key
            .map_err(|e| GenerationFailure::transport(provider, format!("Gemini: {}", e.without_url())))?;

        let status = response.status();
        tracing::info!("Gemini response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| {
                GenerationFailure::transport(provider, format!("Gemini body: {}", e.without_url()))
            })?;

        let text = Self::interpret_response(status, &body)?;
        Ok(GenerationResult {
            text,
            provider_used: provider,
        })
    }

    fn provider(&self) -> ProviderId {
        ProviderId::Gemini
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FailureKind;

    #[test]
    fn test_payload_puts_system_prompt_first() {
        let request = GenerationRequest::new("Analyze AAPL")
            .with_system_prompt("You are an analyst")
            .with_temperature(0.2)
            .with_max_output_tokens(256);

        let payload = serde_json::to_value(GeminiAdapter::build_payload(&request)).unwrap();

        assert_eq!(payload["contents"].as_array().unwrap().len(), 1);
        assert_eq!(payload["contents"][0]["parts"][0]["text"], "You are an analyst");
        assert_eq!(payload["contents"][0]["parts"][1]["text"], "Analyze AAPL");
        assert_eq!(payload["generationConfig"]["maxOutputTokens"], 256);
        assert_eq!(payload["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(payload["safetySettings"][0]["threshold"], "BLOCK_NONE");
    }

    #[test]
    fn test_endpoint_version_follows_model() {
        let adapter = GeminiAdapter::new("k".into(), DEFAULT_MODEL.into());
        assert_eq!(
            adapter.endpoint("gemini-1.5-flash", "k"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent?key=k"
        );
        assert!(adapter.endpoint("gemini-pro", "k").contains("/v1/models/gemini-pro"));
    }

    #[test]
    fn test_interpret_success() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Hold."}]},"finishReason":"STOP"}]}"#;
        assert_eq!(GeminiAdapter::interpret_response(StatusCode::OK, body).unwrap(), "Hold.");
    }

    #[test]
    fn test_interpret_blocked_finish_reason() {
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        let err = GeminiAdapter::interpret_response(StatusCode::OK, body).unwrap_err();
        assert_eq!(err.kind, FailureKind::ContentBlocked);
        assert!(err.message.contains("SAFETY"));
    }

    #[test]
    fn test_interpret_empty_candidates_and_blank_text() {
        let err = GeminiAdapter::interpret_response(StatusCode::OK, r#"{"candidates":[]}"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::EmptyContent);

        let blank = r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#;
        let err = GeminiAdapter::interpret_response(StatusCode::OK, blank).unwrap_err();
        assert_eq!(err.kind, FailureKind::EmptyContent);
    }

    #[test]
    fn test_interpret_non_json_success_body() {
        let err = GeminiAdapter::interpret_response(StatusCode::OK, "<html>").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidResponse);
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_prompt_before_network() {
        // Unroutable base: any network attempt would surface as TransportError instead
        let adapter = GeminiAdapter::with_options(
            "key".into(),
            DEFAULT_MODEL.into(),
            "http://127.0.0.1:9".into(),
            None,
        );
        let err = adapter.generate(&GenerationRequest::new("")).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::ConfigError);
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_api_key() {
        let adapter = GeminiAdapter::with_options(
            "SUPERSECRETKEY".into(),
            DEFAULT_MODEL.into(),
            "http://127.0.0.1:9".into(),
            None,
        );
        let err = adapter.generate(&GenerationRequest::new("hi")).await.unwrap_err();

        assert_eq!(err.kind, FailureKind::TransportError);
        assert!(err.message.starts_with("Gemini: "));
        assert!(!err.message.contains("SUPERSECRETKEY"), "{}", err.message);
        assert!(!err.message.contains("key="), "{}", err.message);
    }

    #[tokio::test]
    async fn test_generate_requires_api_key() {
        let adapter = GeminiAdapter::with_options(
            String::new(),
            DEFAULT_MODEL.into(),
            "http://127.0.0.1:9".into(),
            None,
        );
        let err = adapter.generate(&GenerationRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::ConfigError);
    }
}
