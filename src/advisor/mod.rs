// advisor/mod.rs - Investment use cases run through the failover orchestrator

use std::sync::Arc;

use crate::extract::extract_json_as;
use crate::orchestrator::FailoverOrchestrator;

pub mod autocomplete;
mod cache;
mod collaborators;
pub mod outlook;
pub mod predictions;
pub mod prompts;
pub mod types;

pub use collaborators::{
    CompanyProfile, InsightStore, MarketData, MarketDataError, NoopInsightStore,
    PortfolioInsight, PricePoint, StoreError,
};
pub use cache::{TtlCache, DEFAULT_TTL_HOURS};
pub use outlook::OutlookCache;
pub use prompts::PromptPair;
pub use types::*;

const INTENT_TEMPERATURE: f32 = 0.1;
const INTENT_MAX_TOKENS: u32 = 20;

/// Facade over the prompt builders. Cheap to clone, all state is shared.
#[derive(Clone)]
pub struct InvestmentAdvisor {
    llm: Arc<FailoverOrchestrator>,
    market: Arc<dyn MarketData>,
    insights: Arc<dyn InsightStore>,
    outlook: Arc<OutlookCache>,
}

impl InvestmentAdvisor {
    pub fn new(
        llm: Arc<FailoverOrchestrator>,
        market: Arc<dyn MarketData>,
        insights: Arc<dyn InsightStore>,
    ) -> Self {
        Self {
            llm,
            market,
            insights,
            outlook: Arc::new(OutlookCache::default()),
        }
    }

    pub fn orchestrator(&self) -> &FailoverOrchestrator {
        &self.llm
    }

    /// Analysis text, also saved as an insight for `user_id`
    pub async fn analyze_portfolio(
        &self,
        user_id: &str,
        portfolio: &Portfolio,
        risk_profile: RiskProfile,
    ) -> Result<String, AdvisorError> {
        let request = prompts::portfolio_analysis(portfolio, risk_profile).into_request();
        let analysis = self.llm.generate_text(request).await?;

        let insight = PortfolioInsight::new(user_id, portfolio, &analysis);
        if let Err(e) = self.insights.save_portfolio_insight(insight).await {
            tracing::warn!("Failed to save portfolio insight for {}: {}", user_id, e);
        }

        Ok(analysis)
    }

    pub async fn recommend(
        &self,
        risk_profile: RiskProfile,
        goals: &str,
        portfolio: &Portfolio,
    ) -> Result<String, AdvisorError> {
        let overview = self.market.market_overview().await?;
        let request = prompts::recommendations(risk_profile, goals, portfolio, &overview).into_request();
        Ok(self.llm.generate_text(request).await?)
    }

    pub async fn chat(&self, history: &[ChatMessage], message: &str) -> Result<String, AdvisorError> {
        let request = prompts::chat(history, message).into_request();
        Ok(self.llm.generate_text(request).await?)
    }

    pub async fn predict_portfolio(&self, portfolio: &Portfolio) -> PredictionReport {
        predictions::predict_holdings(&self.llm, self.market.as_ref(), &portfolio.holdings).await
    }

    /// Empty on any failure
    pub async fn autocomplete(
        &self,
        input: &str,
        context: &str,
        options: &AutocompleteOptions,
    ) -> Vec<Suggestion> {
        if options.limit == 0 {
            return Vec::new();
        }

        let request = prompts::autocomplete(input, context, options.limit)
            .into_request()
            .with_temperature(options.temperature);

        match self.llm.generate_text(request).await {
            Ok(text) => autocomplete::parse_suggestions(&text, options),
            Err(e) => {
                tracing::warn!("Autocomplete generation failed: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn allocate_portfolio(
        &self,
        risk_profile: RiskProfile,
        goals: &str,
        amount: f64,
        horizon: InvestmentHorizon,
    ) -> Result<PortfolioAllocation, AdvisorError> {
        let request = prompts::allocation(risk_profile, goals, amount, horizon).into_request();
        let text = self.llm.generate_text(request).await?;
        Ok(extract_json_as(&text)?)
    }

    pub async fn recommend_rebalancing(
        &self,
        portfolio: &Portfolio,
        risk_profile: RiskProfile,
    ) -> Result<RebalancePlan, AdvisorError> {
        let request = prompts::rebalance(portfolio, risk_profile).into_request();
        let text = self.llm.generate_text(request).await?;
        Ok(extract_json_as(&text)?)
    }

    /// Falls back to [`SearchIntent::StockLookup`]
    pub async fn search_intent(&self, query: &str) -> SearchIntent {
        let request = prompts::search_intent(query)
            .into_request()
            .with_temperature(INTENT_TEMPERATURE)
            .with_max_output_tokens(INTENT_MAX_TOKENS);

        match self.llm.generate_text(request).await {
            Ok(reply) => SearchIntent::from_reply(&reply).unwrap_or_else(|| {
                tracing::debug!("Unrecognized search intent '{}'", reply.trim());
                SearchIntent::StockLookup
            }),
            Err(e) => {
                tracing::warn!("Search intent classification failed: {}", e);
                SearchIntent::StockLookup
            }
        }
    }
}
