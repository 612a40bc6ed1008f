// llm/types.rs - Request, result and failure types shared by all adapters

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;

/// The two interchangeable completion services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Google Gemini
    #[serde(alias = "primary")]
    Gemini,
    /// OpenRouter chat completions
    #[serde(alias = "secondary")]
    OpenRouter,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini",
            ProviderId::OpenRouter => "openrouter",
        }
    }

    /// The provider used for the single failover hop
    pub fn alternate(&self) -> ProviderId {
        match self {
            ProviderId::Gemini => ProviderId::OpenRouter,
            ProviderId::OpenRouter => ProviderId::Gemini,
        }
    }

    /// Parse a stored or configured provider name, `None` for unknown names
    pub fn parse(value: &str) -> Option<ProviderId> {
        match value.trim().to_lowercase().as_str() {
            "gemini" | "primary" => Some(ProviderId::Gemini),
            "openrouter" | "secondary" => Some(ProviderId::OpenRouter),
            _ => None,
        }
    }
}

impl Default for ProviderId {
    fn default() -> Self {
        ProviderId::Gemini
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single generation call. Built once, never mutated by adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub provider: Option<ProviderId>,
    pub model: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            provider: None,
            model: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Checks run by every adapter before touching the network
    pub fn validate(&self, provider: ProviderId) -> Result<(), GenerationFailure> {
        if self.prompt.trim().is_empty() {
            return Err(GenerationFailure::config(provider, "prompt must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(GenerationFailure::config(
                provider,
                format!("temperature {} outside 0..=2", self.temperature),
            ));
        }
        if self.max_output_tokens == 0 {
            return Err(GenerationFailure::config(
                provider,
                "max_output_tokens must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Non-blank system prompt, if any
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Successful generation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub text: String,
    pub provider_used: ProviderId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    RateLimited,
    QuotaExceeded,
    InvalidResponse,
    EmptyContent,
    ContentBlocked,
    TransportError,
    ConfigError,
}

/// Adapter failure with retry classification left to the orchestrator
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{provider} {kind:?}: {message}")]
pub struct GenerationFailure {
    pub kind: FailureKind,
    pub provider: ProviderId,
    pub message: String,
    /// HTTP status when the failure came from a non-success response
    pub status: Option<u16>,
}

impl GenerationFailure {
    pub fn new(kind: FailureKind, provider: ProviderId, message: impl Into<String>) -> Self {
        Self {
            kind,
            provider,
            message: message.into(),
            status: None,
        }
    }

    pub fn config(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::new(FailureKind::ConfigError, provider, message)
    }

    pub fn transport(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::new(FailureKind::TransportError, provider, message)
    }

    pub fn invalid_response(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidResponse, provider, message)
    }

    pub fn empty_content(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::new(FailureKind::EmptyContent, provider, message)
    }

    pub fn content_blocked(provider: ProviderId, finish_reason: &str) -> Self {
        Self::new(
            FailureKind::ContentBlocked,
            provider,
            format!("Content generation stopped: {}", finish_reason),
        )
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_prompt_is_config_error() {
        let err = GenerationRequest::new("   ")
            .validate(ProviderId::Gemini)
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::ConfigError);
        assert_eq!(err.provider, ProviderId::Gemini);
    }

    #[test]
    fn test_temperature_and_tokens_bounds() {
        let hot = GenerationRequest::new("hi").with_temperature(2.5);
        assert!(hot.validate(ProviderId::OpenRouter).is_err());

        let no_tokens = GenerationRequest::new("hi").with_max_output_tokens(0);
        assert!(no_tokens.validate(ProviderId::OpenRouter).is_err());

        let ok = GenerationRequest::new("hi").with_temperature(2.0);
        assert!(ok.validate(ProviderId::OpenRouter).is_ok());
    }

    #[test]
    fn test_provider_parse_accepts_neutral_names() {
        assert_eq!(ProviderId::parse("Primary"), Some(ProviderId::Gemini));
        assert_eq!(ProviderId::parse("openrouter"), Some(ProviderId::OpenRouter));
        assert_eq!(ProviderId::parse("openai"), None);
        assert_eq!(ProviderId::Gemini.alternate(), ProviderId::OpenRouter);
    }

    #[test]
    fn test_blank_system_prompt_is_ignored() {
        let request = GenerationRequest::new("hi").with_system_prompt("  ");
        assert_eq!(request.system_prompt(), None);
    }
}
