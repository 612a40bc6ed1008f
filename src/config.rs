use std::env;
use std::time::Duration;

use crate::llm::{gemini, openrouter, ProviderId};
use crate::settings::UserSettings;

pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const ENV_OPENROUTER_MODEL: &str = "OPENROUTER_MODEL";
pub const ENV_PROVIDER: &str = "AI_PROVIDER";
pub const ENV_GEMINI_API_BASE: &str = "GEMINI_API_BASE";
pub const ENV_OPENROUTER_API_URL: &str = "OPENROUTER_API_URL";
pub const ENV_OPENROUTER_REFERER: &str = "OPENROUTER_REFERER";
pub const ENV_OPENROUTER_APP_TITLE: &str = "OPENROUTER_APP_TITLE";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "AI_REQUEST_TIMEOUT_SECS";

/// Key and default model for one provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCredentials {
    pub api_key: String,
    pub model: String,
}

impl ProviderCredentials {
    pub fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Process-wide provider configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub gemini: ProviderCredentials,
    pub openrouter: ProviderCredentials,
    pub preferred_provider: ProviderId,
    pub gemini_base_url: String,
    pub openrouter_url: String,
    pub openrouter_referer: String,
    pub openrouter_app_title: String,
    /// `None` leaves the transport default in place
    pub request_timeout: Option<Duration>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            gemini: ProviderCredentials {
                api_key: String::new(),
                model: gemini::DEFAULT_MODEL.to_string(),
            },
            openrouter: ProviderCredentials {
                api_key: String::new(),
                model: openrouter::DEFAULT_MODEL.to_string(),
            },
            preferred_provider: ProviderId::Gemini,
            gemini_base_url: gemini::DEFAULT_BASE_URL.to_string(),
            openrouter_url: openrouter::OPENROUTER_URL.to_string(),
            openrouter_referer: openrouter::DEFAULT_REFERER.to_string(),
            openrouter_app_title: openrouter::DEFAULT_APP_TITLE.to_string(),
            request_timeout: None,
        }
    }
}

impl ProviderConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`ProviderConfig::from_env`] with an injectable variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();

        let preferred_provider = match get(ENV_PROVIDER) {
            Some(name) => ProviderId::parse(&name).unwrap_or_else(|| {
                tracing::warn!("Unknown {} '{}', using {}", ENV_PROVIDER, name, defaults.preferred_provider);
                defaults.preferred_provider
            }),
            None => defaults.preferred_provider,
        };

        let request_timeout = get(ENV_REQUEST_TIMEOUT_SECS).and_then(|raw| match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
            _ => {
                tracing::warn!("Ignoring invalid {}='{}'", ENV_REQUEST_TIMEOUT_SECS, raw);
                None
            }
        });

        let config = Self {
            gemini: ProviderCredentials {
                api_key: get(ENV_GEMINI_API_KEY).unwrap_or_default(),
                model: get(ENV_GEMINI_MODEL).unwrap_or(defaults.gemini.model),
            },
            openrouter: ProviderCredentials {
                api_key: get(ENV_OPENROUTER_API_KEY).unwrap_or_default(),
                model: get(ENV_OPENROUTER_MODEL).unwrap_or(defaults.openrouter.model),
            },
            preferred_provider,
            gemini_base_url: get(ENV_GEMINI_API_BASE).unwrap_or(defaults.gemini_base_url),
            openrouter_url: get(ENV_OPENROUTER_API_URL).unwrap_or(defaults.openrouter_url),
            openrouter_referer: get(ENV_OPENROUTER_REFERER).unwrap_or(defaults.openrouter_referer),
            openrouter_app_title: get(ENV_OPENROUTER_APP_TITLE)
                .unwrap_or(defaults.openrouter_app_title),
            request_timeout,
        };

        tracing::info!(
            "Provider config: preferred={}, gemini_key={}, openrouter_key={}",
            config.preferred_provider,
            config.gemini.has_key(),
            config.openrouter.has_key()
        );

        config
    }

    /// Apply per-user overrides; blank values keep the process defaults
    pub fn with_user_settings(mut self, settings: &UserSettings) -> Self {
        if let Some(key) = non_blank(settings.gemini_api_key.as_deref()) {
            self.gemini.api_key = key;
        }
        if let Some(key) = non_blank(settings.openrouter_api_key.as_deref()) {
            self.openrouter.api_key = key;
        }
        if let Some(provider) = settings.preferred_provider {
            self.preferred_provider = provider;
        }
        self
    }

    pub fn credentials(&self, provider: ProviderId) -> &ProviderCredentials {
        match provider {
            ProviderId::Gemini => &self.gemini,
            ProviderId::OpenRouter => &self.openrouter,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = ProviderConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ProviderConfig::default());
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.openrouter.model, "deepseek/deepseek-r1:free");
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn test_environment_values() {
        let config = ProviderConfig::from_lookup(lookup(&[
            (ENV_GEMINI_API_KEY, " gem-key "),
            (ENV_OPENROUTER_MODEL, "qwen/qwen2.5-vl-3b-instruct:free"),
            (ENV_PROVIDER, "openrouter"),
            (ENV_REQUEST_TIMEOUT_SECS, "30"),
            (ENV_GEMINI_MODEL, ""),
        ]));

        assert_eq!(config.gemini.api_key, "gem-key");
        assert_eq!(config.gemini.model, gemini::DEFAULT_MODEL);
        assert_eq!(config.openrouter.model, "qwen/qwen2.5-vl-3b-instruct:free");
        assert_eq!(config.preferred_provider, ProviderId::OpenRouter);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ProviderConfig::from_lookup(lookup(&[
            (ENV_PROVIDER, "anthropic"),
            (ENV_REQUEST_TIMEOUT_SECS, "soon"),
        ]));
        assert_eq!(config.preferred_provider, ProviderId::Gemini);
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn test_user_settings_override() {
        let base = ProviderConfig::from_lookup(lookup(&[
            (ENV_GEMINI_API_KEY, "env-gem"),
            (ENV_OPENROUTER_API_KEY, "env-or"),
        ]));

        let settings = UserSettings {
            preferred_provider: Some(ProviderId::OpenRouter),
            gemini_api_key: Some("user-gem".to_string()),
            openrouter_api_key: Some("   ".to_string()),
        };
        let config = base.with_user_settings(&settings);

        assert_eq!(config.gemini.api_key, "user-gem");
        assert_eq!(config.openrouter.api_key, "env-or");
        assert_eq!(config.preferred_provider, ProviderId::OpenRouter);
    }
}
