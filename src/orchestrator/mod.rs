// orchestrator/mod.rs - Provider failover orchestrator

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;

use crate::config::ProviderConfig;
use crate::llm::{GenerationFailure, GenerationRequest, GenerationResult, ProviderId};
use crate::settings::SettingsSource;

use self::classify::failover_reason;
use self::metrics::Metrics;
use self::provider_registry::providers_from_config;
pub use self::provider_registry::ProviderSet;

pub mod classify;
pub mod metrics;
pub mod provider_registry;

/// Settings needed to build the provider pair on first use
struct LazyInit {
    defaults: ProviderConfig,
    settings: Arc<dyn SettingsSource>,
}

/// Chooses the active provider and performs the one-shot failover hop.
///
/// Session state (the active provider) lives behind a lock that is never
/// held across an await, so one orchestrator can serve concurrent callers.
pub struct FailoverOrchestrator {
    providers: OnceCell<ProviderSet>,
    init: Option<LazyInit>,
    session: Mutex<Option<ProviderId>>,
    metrics: Mutex<Metrics>,
}

impl FailoverOrchestrator {
    /// Orchestrator over an already-built provider pair
    pub fn new(providers: ProviderSet) -> Self {
        Self {
            providers: OnceCell::new_with(Some(providers)),
            init: None,
            session: Mutex::new(None),
            metrics: Mutex::new(Metrics::new()),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(providers_from_config(config))
    }

    /// Process defaults, overridden by user settings loaded on the first generation
    pub fn with_settings(defaults: ProviderConfig, settings: Arc<dyn SettingsSource>) -> Self {
        Self {
            providers: OnceCell::new(),
            init: Some(LazyInit { defaults, settings }),
            session: Mutex::new(None),
            metrics: Mutex::new(Metrics::new()),
        }
    }

    pub fn from_env() -> Self {
        Self::from_config(&ProviderConfig::from_env())
    }

    /// Generate with the active provider, failing over once on quota/rate limits
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResult, GenerationFailure> {
        let providers = self.providers().await;
        let first = request
            .provider
            .unwrap_or_else(|| self.session_provider(providers));

        let failure = match self.attempt(providers, first, &request).await {
            Ok(result) => return Ok(result),
            Err(failure) => failure,
        };

        if first != ProviderId::Gemini {
            tracing::error!("LLM: '{}' failed, no failover from secondary: {}", first, failure);
            return Err(failure);
        }

        let Some(reason) = failover_reason(&failure) else {
            tracing::error!("LLM: '{}' failed: {}", first, failure);
            return Err(failure);
        };

        let fallback = first.alternate();
        tracing::warn!(
            "LLM: '{}' {:?}, falling back to '{}'",
            first,
            reason,
            fallback
        );
        *lock(&self.session) = Some(fallback);
        lock(&self.metrics).record_failover();

        // The model override names a primary model; the fallback uses its own default
        let mut retry = request;
        retry.provider = Some(fallback);
        retry.model = None;

        self.attempt(providers, fallback, &retry).await.map_err(|e| {
            tracing::error!("LLM: fallback '{}' failed: {}", fallback, e);
            e
        })
    }

    /// [`FailoverOrchestrator::generate`] returning only the text
    pub async fn generate_text(&self, request: GenerationRequest) -> Result<String, GenerationFailure> {
        self.generate(request).await.map(|result| result.text)
    }

    /// Provider the next request without an explicit override will start on
    pub async fn active_provider(&self) -> ProviderId {
        let providers = self.providers().await;
        self.session_provider(providers)
    }

    /// Forget any failover and start again from the configured preference
    pub fn reset_session(&self) {
        *lock(&self.session) = None;
        tracing::info!("LLM: session provider reset");
    }

    pub fn get_metrics(&self) -> Metrics {
        lock(&self.metrics).clone()
    }

    async fn providers(&self) -> &ProviderSet {
        self.providers
            .get_or_init(|| async {
                let config = match self.init.as_ref() {
                    Some(init) => resolve_config(init).await,
                    None => ProviderConfig::default(),
                };
                providers_from_config(&config)
            })
            .await
    }

    fn session_provider(&self, providers: &ProviderSet) -> ProviderId {
        lock(&self.session).unwrap_or(providers.preferred)
    }

    async fn attempt(
        &self,
        providers: &ProviderSet,
        provider: ProviderId,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationFailure> {
        tracing::info!("LLM: Trying provider '{}'...", provider);

        match providers.adapter(provider).generate(request).await {
            Ok(result) => {
                tracing::info!(
                    "LLM: '{}' succeeded ({} chars)",
                    provider,
                    result.text.len()
                );
                lock(&self.metrics).record_success(provider);
                Ok(result)
            }
            Err(e) => {
                tracing::warn!("LLM: '{}' failed: {:?}", provider, e.kind);
                lock(&self.metrics).record_failure(provider);
                Err(e)
            }
        }
    }
}

/// Best-effort settings load; any failure keeps the process defaults
async fn resolve_config(init: &LazyInit) -> ProviderConfig {
    match init.settings.load().await {
        Ok(Some(settings)) => {
            tracing::info!("LLM: applying user settings");
            init.defaults.clone().with_user_settings(&settings)
        }
        Ok(None) => init.defaults.clone(),
        Err(e) => {
            tracing::warn!("Failed to load user settings: {}. Using defaults.", e);
            init.defaults.clone()
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
