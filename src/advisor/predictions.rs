// advisor/predictions.rs - Per-holding return predictions with isolated failures

use super::collaborators::MarketData;
use super::prompts;
use super::types::{AdvisorError, Holding, Prediction, PredictionFailure, PredictionReport};
use crate::extract::parse_prediction;
use crate::orchestrator::FailoverOrchestrator;

async fn predict_holding(
    llm: &FailoverOrchestrator,
    market: &dyn MarketData,
    holding: &Holding,
) -> Result<Prediction, AdvisorError> {
    let (prices, profile) = tokio::try_join!(
        market.historical_prices(&holding.symbol),
        market.company_profile(&holding.symbol),
    )?;

    let request = prompts::prediction(holding, &profile, &prices).into_request();
    let text = llm.generate_text(request).await?;

    Ok(parse_prediction(&holding.symbol, &text))
}

/// Holdings run one at a time; a failing holding is recorded and skipped
pub async fn predict_holdings(
    llm: &FailoverOrchestrator,
    market: &dyn MarketData,
    holdings: &[Holding],
) -> PredictionReport {
    let mut report = PredictionReport::default();

    for holding in holdings {
        match predict_holding(llm, market, holding).await {
            Ok(prediction) => report.predictions.push(prediction),
            Err(e) => {
                tracing::warn!("Prediction for {} failed: {}", holding.symbol, e);
                report.failures.push(PredictionFailure {
                    symbol: holding.symbol.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        "Predictions: {} succeeded, {} failed",
        report.predictions.len(),
        report.failures.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::types::RiskLevel;
    use crate::llm::{GenerationFailure, ProviderId};
    use crate::orchestrator::ProviderSet;
    use crate::testing::{MockMarketData, ScriptedAdapter};

    fn llm(replies: Vec<Result<&str, GenerationFailure>>) -> (FailoverOrchestrator, std::sync::Arc<ScriptedAdapter>) {
        let primary = ScriptedAdapter::new(ProviderId::Gemini, replies);
        let secondary = ScriptedAdapter::new(ProviderId::OpenRouter, vec![]);
        let orchestrator =
            FailoverOrchestrator::new(ProviderSet::new(primary.clone(), secondary, ProviderId::Gemini));
        (orchestrator, primary)
    }

    fn holdings() -> Vec<Holding> {
        vec![
            Holding::new("AAPL", 10.0, 150.0),
            Holding::new("GONE", 1.0, 10.0),
            Holding::new("MSFT", 5.0, 300.0),
        ]
    }

    #[tokio::test]
    async fn test_one_failing_holding_does_not_abort_the_rest() {
        let (llm, primary) = llm(vec![
            Ok("Predicted return: 5%\nConfidence: 0.8\nRisk level: Low"),
            Ok("Predicted return: -2%\nConfidence: 40\nRisk level: High"),
        ]);
        let market = MockMarketData::new().failing_history("GONE");

        let report = predict_holdings(&llm, &market, &holdings()).await;

        assert_eq!(report.predictions.len(), 2);
        assert_eq!(report.predictions[0].symbol, "AAPL");
        assert_eq!(report.predictions[0].risk_level, RiskLevel::Low);
        assert_eq!(report.predictions[1].symbol, "MSFT");
        assert_eq!(report.predictions[1].predicted_return, -2.0);
        assert_eq!(report.predictions[1].confidence, 0.4);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].symbol, "GONE");
        assert!(report.failures[0].error.contains("GONE"));

        // the failing holding never reached the model
        assert_eq!(primary.calls(), 2);
    }

    #[tokio::test]
    async fn test_generation_failure_is_recorded_per_holding() {
        let (llm, _) = llm(vec![
            Err(GenerationFailure::invalid_response(ProviderId::Gemini, "bad body")),
            Ok("Predicted return: 1%"),
            Ok("Predicted return: 3%"),
        ]);
        let market = MockMarketData::new();

        let report = predict_holdings(&llm, &market, &holdings()).await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].symbol, "AAPL");
        assert_eq!(
            report.predictions.iter().map(|p| p.symbol.as_str()).collect::<Vec<_>>(),
            vec!["GONE", "MSFT"]
        );
    }
}
