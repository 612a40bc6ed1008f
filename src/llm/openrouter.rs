// llm/openrouter.rs - OpenRouter adapter (secondary provider)

use super::{
    http_failure, parse_body, require_key, ApiErrorBody, CompletionAdapter, GenerationFailure,
    GenerationRequest, GenerationResult, ProviderId,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-r1:free";
pub const DEFAULT_REFERER: &str = "http://localhost";
pub const DEFAULT_APP_TITLE: &str = "Finance App";

const LABEL: &str = "OpenRouter";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Caller identity OpenRouter asks integrators to send with every request
#[derive(Debug, Clone)]
pub struct AppIdentity {
    pub referer: String,
    pub title: String,
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self {
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_APP_TITLE.to_string(),
        }
    }
}

pub struct OpenRouterAdapter {
    client: Client,
    api_key: String,
    model: String,
    url: String,
    identity: AppIdentity,
}

impl OpenRouterAdapter {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_options(
            api_key,
            model,
            OPENROUTER_URL.to_string(),
            AppIdentity::default(),
            None,
        )
    }

    pub fn with_options(
        api_key: String,
        model: String,
        url: String,
        identity: AppIdentity,
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
            url,
            identity,
        }
    }

    fn build_payload(request: &GenerationRequest, model: &str) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system_prompt) = request.system_prompt() {
            messages.push(Message {
                role: "system",
                content: system_prompt.to_string(),
            });
        }
        messages.push(Message {
            role: "user",
            content: request.prompt.clone(),
        });

        ChatRequest {
            model: model.to_string(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
        }
    }

    fn interpret_response(status: StatusCode, body: &str) -> Result<String, GenerationFailure> {
        let provider = ProviderId::OpenRouter;

        if !status.is_success() {
            let failure = http_failure(provider, LABEL, status, body);
            tracing::error!("{}", failure.message);
            return Err(failure);
        }

        let chat: ChatResponse = parse_body(provider, LABEL, body)?;

        // Upstream failures are sometimes reported with a 200 and an error object
        if let Some(error) = chat.error.as_ref() {
            return Err(GenerationFailure::transport(
                provider,
                format!("{} API error: {}", LABEL, error.describe()),
            ));
        }

        let choice = chat.choices.first().ok_or_else(|| {
            GenerationFailure::empty_content(provider, "No content generated from OpenRouter")
        })?;

        choice
            .message
            .as_ref()
            .and_then(|m| m.content.as_deref())
            .filter(|content| !content.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                GenerationFailure::empty_content(provider, "Empty content received from OpenRouter")
            })
    }
}

#[async_trait]
impl CompletionAdapter for OpenRouterAdapter {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationFailure> {
        let provider = self.provider();
        request.validate(provider)?;
        let api_key = require_key(provider, LABEL, &self.api_key)?;

        let model = request.model.as_deref().unwrap_or(&self.model);
        let payload = Self::build_payload(request, model);

        tracing::debug!(
            "OpenRouter payload: model={}, temperature={}, max_tokens={}, message_count={}",
            payload.model,
            payload.temperature,
            payload.max_tokens,
            payload.messages.len()
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.identity.referer)
            .header("X-Title", &self.identity.title)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerationFailure::transport(provider, format!("OpenRouter: {}", e)))?;

        let status = response.status();
        tracing::info!("OpenRouter response status: {}", status);

        let body = response.text().await.map_err(|e| {
            GenerationFailure::transport(provider, format!("OpenRouter body: {}", e))
        })?;

        let text = Self::interpret_response(status, &body)?;
        Ok(GenerationResult {
            text,
            provider_used: provider,
        })
    }

    fn provider(&self) -> ProviderId {
        ProviderId::OpenRouter
    }
}
