// advisor/types.rs - Domain types for the investment use cases

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::extract::ParseError;
use crate::llm::GenerationFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Conservative,
    Moderate,
    Aggressive,
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskProfile::Conservative => "conservative",
            RiskProfile::Moderate => "moderate",
            RiskProfile::Aggressive => "aggressive",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentHorizon {
    Short,
    Medium,
    Long,
}

impl fmt::Display for InvestmentHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InvestmentHorizon::Short => "short",
            InvestmentHorizon::Medium => "medium",
            InvestmentHorizon::Long => "long",
        })
    }
}

/// One position in a portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    pub shares: f64,
    /// Cost basis per share
    pub average_price: f64,
    #[serde(default)]
    pub current_price: Option<f64>,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, shares: f64, average_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            shares,
            average_price,
            current_price: None,
        }
    }

    /// Market value, at cost when no current price is known
    pub fn value(&self) -> f64 {
        self.shares * self.current_price.unwrap_or(self.average_price)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub holdings: Vec<Holding>,
    #[serde(default)]
    pub cash_balance: f64,
}

impl Portfolio {
    pub fn total_value(&self) -> f64 {
        self.holdings.iter().map(Holding::value).sum::<f64>() + self.cash_balance
    }

    /// Fraction of total value held in `holding`
    pub fn weight(&self, holding: &Holding) -> f64 {
        let total = self.total_value();
        if total <= 0.0 {
            0.0
        } else {
            holding.value() / total
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    pub fn parse(value: &str) -> Option<RiskLevel> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

pub const DEFAULT_TIMEFRAME: &str = "3 months";

/// Return prediction for one holding, scraped from free text
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub symbol: String,
    /// Percent
    pub predicted_return: f64,
    /// 0..=1
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub reasoning: String,
    pub timeframe: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionFailure {
    pub symbol: String,
    pub error: String,
}

/// Partial-failure result of a portfolio prediction run
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PredictionReport {
    pub predictions: Vec<Prediction>,
    pub failures: Vec<PredictionFailure>,
}

/// An autocomplete entry as the model returned it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Suggestion {
    Plain(String),
    Scored {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        score: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl Suggestion {
    pub fn text(&self) -> &str {
        match self {
            Suggestion::Plain(text) => text,
            Suggestion::Scored { text, .. } => text,
        }
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            Suggestion::Plain(_) => None,
            Suggestion::Scored { score, .. } => *score,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutocompleteOptions {
    pub limit: usize,
    /// Scored entries below this are dropped; plain entries always pass
    pub threshold: Option<f64>,
    pub temperature: f32,
}

impl Default for AutocompleteOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            threshold: None,
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub percentage: f64,
    #[serde(default)]
    pub tickers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAllocation {
    pub allocation: BTreeMap<String, AllocationSlice>,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceAction {
    pub ticker: String,
    pub action: TradeAction,
    #[serde(default)]
    pub shares: f64,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalancePlan {
    pub actions: Vec<RebalanceAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchIntent {
    StockLookup,
    EtfLookup,
    InvestmentIdea,
    PortfolioAnalysis,
    MarketNews,
    Educational,
}

impl SearchIntent {
    pub const ALL: [SearchIntent; 6] = [
        SearchIntent::StockLookup,
        SearchIntent::EtfLookup,
        SearchIntent::InvestmentIdea,
        SearchIntent::PortfolioAnalysis,
        SearchIntent::MarketNews,
        SearchIntent::Educational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchIntent::StockLookup => "stock_lookup",
            SearchIntent::EtfLookup => "etf_lookup",
            SearchIntent::InvestmentIdea => "investment_idea",
            SearchIntent::PortfolioAnalysis => "portfolio_analysis",
            SearchIntent::MarketNews => "market_news",
            SearchIntent::Educational => "educational",
        }
    }

    /// Find the first intent label in a reply
    pub fn from_reply(reply: &str) -> Option<SearchIntent> {
        let normalized = reply.trim().to_lowercase();
        SearchIntent::ALL
            .into_iter()
            .find(|intent| normalized.contains(intent.as_str()))
    }
}

/// Directional read used by sentiment and outlook replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Sentiment {
    Bearish,
    Neutral,
    Bullish,
}

impl Sentiment {
    /// Ranking weight, bullish highest
    pub fn score(&self) -> u8 {
        match self {
            Sentiment::Bearish => 1,
            Sentiment::Neutral => 2,
            Sentiment::Bullish => 3,
        }
    }
}

impl TryFrom<String> for Sentiment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "bearish" => Ok(Sentiment::Bearish),
            "neutral" => Ok(Sentiment::Neutral),
            "bullish" => Ok(Sentiment::Bullish),
            _ => Err(format!("unknown sentiment '{}'", value)),
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sentiment::Bearish => "bearish",
            Sentiment::Neutral => "neutral",
            Sentiment::Bullish => "bullish",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSentiment {
    pub overall: Sentiment,
    pub sectors: BTreeMap<String, Sentiment>,
    pub analysis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerSentiment {
    #[serde(default)]
    pub ticker: String,
    pub sentiment: Sentiment,
    /// 0..=100
    pub confidence_score: f64,
    pub key_factors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionTimeframe {
    Day,
    Week,
    Month,
    Quarter,
}

impl PredictionTimeframe {
    pub fn parse(value: &str) -> Option<PredictionTimeframe> {
        match value.trim().to_lowercase().as_str() {
            "day" => Some(PredictionTimeframe::Day),
            "week" => Some(PredictionTimeframe::Week),
            "month" => Some(PredictionTimeframe::Month),
            "quarter" => Some(PredictionTimeframe::Quarter),
            _ => None,
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            PredictionTimeframe::Day => "next trading day",
            PredictionTimeframe::Week => "next week",
            PredictionTimeframe::Month => "next month",
            PredictionTimeframe::Quarter => "next quarter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorPrediction {
    pub sector: String,
    pub outlook: Sentiment,
    /// Free text such as "-2% to +1%"
    #[serde(default)]
    pub potential_return: String,
    #[serde(default)]
    pub key_stocks: Vec<String>,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPrediction {
    pub index: String,
    pub current_value: f64,
    pub predicted_range: PriceRange,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub key_drivers: Vec<String>,
}

/// The model-authored part of a market prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOutlook {
    pub market_outlook: Sentiment,
    pub confidence_score: f64,
    pub key_drivers: Vec<String>,
    pub sector_predictions: Vec<SectorPrediction>,
    pub major_index_predictions: Vec<IndexPrediction>,
    #[serde(default)]
    pub analysis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPrediction {
    pub timeframe: PredictionTimeframe,
    pub created_at: String,
    #[serde(flatten)]
    pub outlook: MarketOutlook,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictedPrices {
    #[serde(default)]
    pub one_day: Option<f64>,
    #[serde(default)]
    pub one_week: Option<f64>,
    #[serde(default)]
    pub one_month: Option<f64>,
    #[serde(default)]
    pub three_months: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePrediction {
    #[serde(default)]
    pub ticker: String,
    pub current_price: f64,
    pub predicted_prices: PredictedPrices,
    #[serde(default)]
    pub support_levels: Vec<f64>,
    #[serde(default)]
    pub resistance_levels: Vec<f64>,
    /// 0..=100
    pub confidence: f64,
    #[serde(default)]
    pub technical_factors: Vec<String>,
    #[serde(default)]
    pub fundamental_factors: Vec<String>,
}

/// Advisor errors surfaced to the caller
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("AI generation failed: {0}")]
    Generation(#[from] GenerationFailure),

    #[error("Could not parse AI response: {0}")]
    Parse(#[from] ParseError),

    #[error("Market data error: {0}")]
    MarketData(#[from] super::collaborators::MarketDataError),

    #[error("Insight store error: {0}")]
    Store(#[from] super::collaborators::StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portfolio_weights() {
        let mut apple = Holding::new("AAPL", 10.0, 150.0);
        apple.current_price = Some(200.0);
        let portfolio = Portfolio {
            holdings: vec![apple.clone(), Holding::new("VTI", 5.0, 200.0)],
            cash_balance: 1000.0,
        };

        assert_eq!(portfolio.total_value(), 4000.0);
        assert_eq!(portfolio.weight(&apple), 0.5);
        assert_eq!(Portfolio::default().weight(&apple), 0.0);
    }

    #[test]
    fn test_search_intent_from_reply() {
        assert_eq!(SearchIntent::from_reply(" ETF_LOOKUP\n"), Some(SearchIntent::EtfLookup));
        assert_eq!(
            SearchIntent::from_reply("Intent: portfolio_analysis"),
            Some(SearchIntent::PortfolioAnalysis)
        );
        assert_eq!(SearchIntent::from_reply("shopping"), None);
    }

    #[test]
    fn test_sentiment_is_case_insensitive() {
        let parsed: MarketSentiment = serde_json::from_value(serde_json::json!({
            "overall": "Bullish",
            "sectors": {"Energy": " BEARISH "},
            "analysis": "Risk-on."
        }))
        .unwrap();
        assert_eq!(parsed.overall, Sentiment::Bullish);
        assert_eq!(parsed.sectors["Energy"], Sentiment::Bearish);
        assert_eq!(serde_json::to_value(Sentiment::Neutral).unwrap(), serde_json::json!("neutral"));
        assert!(serde_json::from_value::<Sentiment>(serde_json::json!("sideways")).is_err());
    }

    #[test]
    fn test_suggestion_serializes_untagged() {
        let plain = serde_json::to_value(Suggestion::Plain("AAPL".into())).unwrap();
        assert_eq!(plain, serde_json::json!("AAPL"));

        let scored = Suggestion::Scored {
            text: "MSFT".into(),
            score: Some(0.9),
            description: None,
        };
        assert_eq!(serde_json::to_value(&scored).unwrap(), serde_json::json!({"text": "MSFT", "score": 0.9}));
        assert_eq!(scored.text(), "MSFT");
    }
}
