// advisor/outlook.rs - Market sentiment and forecast use cases with a shared TTL cache

use chrono::{Duration, Utc};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::{Arc, OnceLock};

use super::cache::TtlCache;
use super::prompts;
use super::types::{
    AdvisorError, MarketOutlook, MarketPrediction, MarketSentiment, PredictionTimeframe,
    PricePrediction, SectorPrediction, TickerSentiment,
};
use super::InvestmentAdvisor;
use crate::extract::{extract_json_as, ParseError};

const OUTLOOK_TEMPERATURE: f32 = 0.3;
pub const TOP_SECTOR_COUNT: usize = 3;

/// Parsed outlooks keyed by what they describe
#[derive(Default)]
pub struct OutlookCache {
    market_sentiment: TtlCache<(), MarketSentiment>,
    ticker_sentiment: TtlCache<String, TickerSentiment>,
    market_predictions: TtlCache<PredictionTimeframe, MarketPrediction>,
    price_predictions: TtlCache<String, PricePrediction>,
}

impl OutlookCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            market_sentiment: TtlCache::new(ttl),
            ticker_sentiment: TtlCache::new(ttl),
            market_predictions: TtlCache::new(ttl),
            price_predictions: TtlCache::new(ttl),
        }
    }

    pub fn clear(&self) {
        self.market_sentiment.clear();
        self.ticker_sentiment.clear();
        self.market_predictions.clear();
        self.price_predictions.clear();
    }
}

fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Midpoint of a "-2% to +1%" range; 0 when the text has no range
fn average_return(potential_return: &str) -> f64 {
    static RANGE_RE: OnceLock<Regex> = OnceLock::new();
    let re = RANGE_RE.get_or_init(|| {
        Regex::new(r"([+-]?\d+(?:\.\d+)?)%\s*to\s*([+-]?\d+(?:\.\d+)?)%").expect("valid return range regex")
    });

    re.captures(potential_return)
        .and_then(|caps| {
            let low: f64 = caps.get(1)?.as_str().parse().ok()?;
            let high: f64 = caps.get(2)?.as_str().parse().ok()?;
            Some((low + high) / 2.0)
        })
        .unwrap_or(0.0)
}

/// Bullish sectors first, ties broken by the higher average return
pub fn rank_sectors(sectors: &[SectorPrediction], count: usize) -> Vec<SectorPrediction> {
    let mut ranked = sectors.to_vec();
    ranked.sort_by(|a, b| {
        b.outlook.score().cmp(&a.outlook.score()).then_with(|| {
            average_return(&b.potential_return)
                .partial_cmp(&average_return(&a.potential_return))
                .unwrap_or(Ordering::Equal)
        })
    });
    ranked.truncate(count);
    ranked
}

impl InvestmentAdvisor {
    /// Replace the outlook cache with one using `ttl`
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.outlook = Arc::new(OutlookCache::new(ttl));
        self
    }

    pub fn outlook_cache(&self) -> &OutlookCache {
        &self.outlook
    }

    async fn outlook_text(&self, pair: prompts::PromptPair) -> Result<String, AdvisorError> {
        let request = pair.into_request().with_temperature(OUTLOOK_TEMPERATURE);
        Ok(self.llm.generate_text(request).await?)
    }

    pub async fn market_sentiment(&self, force_refresh: bool) -> Result<MarketSentiment, AdvisorError> {
        if !force_refresh {
            if let Some(cached) = self.outlook.market_sentiment.get(&()) {
                tracing::debug!("Market sentiment served from cache");
                return Ok(cached);
            }
        }

        let text = self.outlook_text(prompts::market_sentiment()).await?;
        let sentiment: MarketSentiment = extract_json_as(&text)?;
        if sentiment.analysis.trim().is_empty() {
            return Err(ParseError::Incomplete("analysis").into());
        }

        self.outlook.market_sentiment.insert((), sentiment.clone());
        Ok(sentiment)
    }

    pub async fn ticker_sentiment(
        &self,
        ticker: &str,
        force_refresh: bool,
    ) -> Result<TickerSentiment, AdvisorError> {
        let ticker = normalize_ticker(ticker);
        if !force_refresh {
            if let Some(cached) = self.outlook.ticker_sentiment.get(&ticker) {
                tracing::debug!("Sentiment for {} served from cache", ticker);
                return Ok(cached);
            }
        }

        let text = self.outlook_text(prompts::ticker_sentiment(&ticker)).await?;
        let mut sentiment: TickerSentiment = extract_json_as(&text)?;
        sentiment.ticker = ticker.clone();

        self.outlook.ticker_sentiment.insert(ticker, sentiment.clone());
        Ok(sentiment)
    }

    pub async fn market_prediction(
        &self,
        timeframe: PredictionTimeframe,
    ) -> Result<MarketPrediction, AdvisorError> {
        if let Some(cached) = self.outlook.market_predictions.get(&timeframe) {
            return Ok(cached);
        }

        let text = self.outlook_text(prompts::market_prediction(timeframe)).await?;
        let outlook: MarketOutlook = extract_json_as(&text)?;
        let prediction = MarketPrediction {
            timeframe,
            created_at: Utc::now().to_rfc3339(),
            outlook,
        };

        tracing::info!(
            "Market prediction for the {}: {}",
            timeframe.phrase(),
            prediction.outlook.market_outlook
        );
        self.outlook.market_predictions.insert(timeframe, prediction.clone());
        Ok(prediction)
    }

    pub async fn price_prediction(&self, ticker: &str) -> Result<PricePrediction, AdvisorError> {
        let ticker = normalize_ticker(ticker);
        if let Some(cached) = self.outlook.price_predictions.get(&ticker) {
            return Ok(cached);
        }

        let text = self.outlook_text(prompts::price_prediction(&ticker)).await?;
        let mut prediction: PricePrediction = extract_json_as(&text)?;
        prediction.ticker = ticker.clone();

        self.outlook.price_predictions.insert(ticker, prediction.clone());
        Ok(prediction)
    }

    /// Best sectors from the (possibly cached) market prediction
    pub async fn top_performing_sectors(
        &self,
        timeframe: PredictionTimeframe,
    ) -> Result<Vec<SectorPrediction>, AdvisorError> {
        let prediction = self.market_prediction(timeframe).await?;
        Ok(rank_sectors(&prediction.outlook.sector_predictions, TOP_SECTOR_COUNT))
    }
}
