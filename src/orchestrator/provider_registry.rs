use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::llm::openrouter::AppIdentity;
use crate::llm::{CompletionAdapter, GeminiAdapter, OpenRouterAdapter, ProviderId};

/// The adapter pair an orchestrator fails over between
#[derive(Clone)]
pub struct ProviderSet {
    pub primary: Arc<dyn CompletionAdapter>,
    pub secondary: Arc<dyn CompletionAdapter>,
    /// Starting provider for a fresh session
    pub preferred: ProviderId,
}

impl ProviderSet {
    pub fn new(
        primary: Arc<dyn CompletionAdapter>,
        secondary: Arc<dyn CompletionAdapter>,
        preferred: ProviderId,
    ) -> Self {
        Self {
            primary,
            secondary,
            preferred,
        }
    }

    pub fn adapter(&self, provider: ProviderId) -> &Arc<dyn CompletionAdapter> {
        match provider {
            ProviderId::Gemini => &self.primary,
            ProviderId::OpenRouter => &self.secondary,
        }
    }
}

/// Build both adapters from resolved configuration.
/// Missing keys are not an error here; the adapter reports them on use.
pub fn providers_from_config(config: &ProviderConfig) -> ProviderSet {
    let gemini = GeminiAdapter::with_options(
        config.gemini.api_key.clone(),
        config.gemini.model.clone(),
        config.gemini_base_url.clone(),
        config.request_timeout,
    );
    tracing::info!("LLM: Gemini adapter loaded (model {})", config.gemini.model);

    let openrouter = OpenRouterAdapter::with_options(
        config.openrouter.api_key.clone(),
        config.openrouter.model.clone(),
        config.openrouter_url.clone(),
        AppIdentity {
            referer: config.openrouter_referer.clone(),
            title: config.openrouter_app_title.clone(),
        },
        config.request_timeout,
    );
    tracing::info!("LLM: OpenRouter adapter loaded (model {})", config.openrouter.model);

    if !config.gemini.has_key() && !config.openrouter.has_key() {
        tracing::warn!("LLM: no provider API keys configured");
    }

    ProviderSet::new(Arc::new(gemini), Arc::new(openrouter), config.preferred_provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapters_match_their_slots() {
        let set = providers_from_config(&ProviderConfig::default());
        assert_eq!(set.adapter(ProviderId::Gemini).provider(), ProviderId::Gemini);
        assert_eq!(set.adapter(ProviderId::OpenRouter).provider(), ProviderId::OpenRouter);
        assert_eq!(set.preferred, ProviderId::Gemini);
    }
}
