// Scripted doubles shared by unit tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::advisor::{
    CompanyProfile, InsightStore, MarketData, MarketDataError, PortfolioInsight, PricePoint,
    StoreError,
};
use crate::llm::{
    CompletionAdapter, GenerationFailure, GenerationRequest, GenerationResult, ProviderId,
};

/// Replays canned replies in order and records every request it sees
pub struct ScriptedAdapter {
    provider: ProviderId,
    replies: Mutex<VecDeque<Result<String, GenerationFailure>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedAdapter {
    pub fn new(provider: ProviderId, replies: Vec<Result<&str, GenerationFailure>>) -> Arc<Self> {
        Arc::new(Self {
            provider,
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionAdapter for ScriptedAdapter {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationFailure> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(GenerationFailure::transport(self.provider, "script exhausted"))
        });
        reply.map(|text| GenerationResult {
            text,
            provider_used: self.provider,
        })
    }

    fn provider(&self) -> ProviderId {
        self.provider
    }
}

/// In-memory market data; history lookups for listed symbols fail
#[derive(Default)]
pub struct MockMarketData {
    failing_history: Vec<String>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_history(mut self, symbol: &str) -> Self {
        self.failing_history.push(symbol.to_string());
        self
    }
}

#[async_trait]
impl MarketData for MockMarketData {
    async fn historical_prices(&self, symbol: &str) -> Result<Vec<PricePoint>, MarketDataError> {
        if self.failing_history.iter().any(|s| s == symbol) {
            return Err(MarketDataError::NotFound(symbol.to_string()));
        }
        Ok((0..3)
            .map(|i| PricePoint {
                date: format!("2024-01-0{}", 3 - i),
                close: 100.0 - i as f64,
                volume: Some(1_000),
            })
            .collect())
    }

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, MarketDataError> {
        Ok(CompanyProfile {
            name: format!("{} Corp", symbol),
            industry: "Technology".to_string(),
            market_cap: 100.0,
            pe_ratio: Some(20.0),
        })
    }

    async fn market_overview(&self) -> Result<serde_json::Value, MarketDataError> {
        Ok(serde_json::json!({"SPY": {"change": 0.5}}))
    }
}

/// Keeps saved insights in memory, or rejects every save
#[derive(Default)]
pub struct RecordingInsightStore {
    fail: bool,
    saved: Mutex<Vec<PortfolioInsight>>,
}

impl RecordingInsightStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Vec<PortfolioInsight> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl InsightStore for RecordingInsightStore {
    async fn save_portfolio_insight(&self, insight: PortfolioInsight) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Backend("database offline".to_string()));
        }
        self.saved.lock().unwrap().push(insight);
        Ok(())
    }
}
