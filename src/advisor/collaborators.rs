// advisor/collaborators.rs - External data sources and sinks the advisor depends on

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::Portfolio;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Market data request failed: {0}")]
    Request(String),

    #[error("No market data for {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Insight store error: {0}")]
    Backend(String),
}

/// Daily price bar, most recent first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: String,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub name: String,
    pub industry: String,
    /// Billions of USD
    pub market_cap: f64,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
}

/// Quote/profile/history provider
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn historical_prices(&self, symbol: &str) -> Result<Vec<PricePoint>, MarketDataError>;

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, MarketDataError>;

    /// Free-form snapshot of indices and sectors, embedded verbatim in prompts
    async fn market_overview(&self) -> Result<serde_json::Value, MarketDataError>;
}

/// A stored portfolio analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioInsight {
    pub id: String,
    pub user_id: String,
    pub portfolio: Portfolio,
    pub analysis: String,
    pub created_at: String,
}

impl PortfolioInsight {
    pub fn new(user_id: &str, portfolio: &Portfolio, analysis: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            portfolio: portfolio.clone(),
            analysis: analysis.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Persistence for generated insights
#[async_trait]
pub trait InsightStore: Send + Sync {
    async fn save_portfolio_insight(&self, insight: PortfolioInsight) -> Result<(), StoreError>;
}

/// Store that keeps nothing, for callers without a backend
pub struct NoopInsightStore;

#[async_trait]
impl InsightStore for NoopInsightStore {
    async fn save_portfolio_insight(&self, insight: PortfolioInsight) -> Result<(), StoreError> {
        tracing::debug!("Discarding portfolio insight {}", insight.id);
        Ok(())
    }
}
