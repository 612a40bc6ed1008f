// advisor/prompts.rs - Pure prompt builders, one per use case

use serde_json::{json, Map, Value};

use super::collaborators::{CompanyProfile, PricePoint};
use super::types::{
    ChatMessage, Holding, InvestmentHorizon, Portfolio, PredictionTimeframe, RiskProfile,
};
use crate::llm::GenerationRequest;

const ANALYST_PERSONA: &str =
    "You are a professional portfolio analyst helping retail investors. Provide clear, actionable advice.";

const CHAT_PERSONA: &str = "You are a helpful financial assistant for retail investors.\n\
Provide accurate, educational responses about investing, stocks, and financial concepts.\n\
Never recommend specific investments without disclaimers.\n\
If you don't know something, admit it rather than making up information.";

const PREDICTION_PERSONA: &str =
    "You are a financial analyst AI that provides investment predictions.";

const ALLOCATION_PERSONA: &str =
    "You are an expert portfolio manager helping retail investors create optimal portfolio allocations.";

const REBALANCE_PERSONA: &str =
    "You are a portfolio manager specializing in portfolio rebalancing for retail investors.";

const AUTOCOMPLETE_PERSONA: &str =
    "You are an investment search assistant providing autocomplete suggestions. Only provide valid JSON.";

const SENTIMENT_PERSONA: &str = "You are a financial market analyst specializing in sentiment analysis across different market sectors. \
Return your response as a valid JSON object without code block markers.";

const TICKER_SENTIMENT_PERSONA: &str = "You are a financial analyst specializing in individual stock sentiment analysis. \
Return your response as a valid JSON object without code block markers.";

const MARKET_PREDICTION_PERSONA: &str = "You are a market analyst specializing in short-term market predictions based on technical and fundamental analysis. \
Provide realistic forecasts with proper uncertainty levels. Respond with a valid JSON object without any markdown code block formatting.";

const PRICE_PREDICTION_PERSONA: &str = "You are a technical analyst specializing in stock price predictions. \
Provide realistic predictions with appropriate levels of uncertainty. Respond with a valid JSON object without any markdown code block formatting.";

pub const SENTIMENT_SECTORS: &[&str] = &[
    "Technology",
    "Healthcare",
    "Financials",
    "Consumer Discretionary",
    "Energy",
    "Industrials",
    "Communication Services",
    "Materials",
    "Utilities",
    "Real Estate",
];

pub const PREDICTION_SECTORS: &[&str] = &[
    "Technology",
    "Healthcare",
    "Financials",
    "Consumer Discretionary",
    "Consumer Staples",
    "Energy",
    "Industrials",
    "Materials",
    "Utilities",
    "Real Estate",
    "Communication Services",
];

pub const MAJOR_INDICES: &[&str] = &[
    "S&P 500",
    "Dow Jones Industrial Average",
    "Nasdaq Composite",
    "Russell 2000",
    "VIX",
];

/// History window embedded in prediction prompts
pub const PREDICTION_HISTORY_DAYS: usize = 30;
const PREDICTION_TREND_POINTS: usize = 5;

/// Provider-agnostic prompt plus optional system prompt
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPair {
    pub prompt: String,
    pub system_prompt: Option<String>,
}

impl PromptPair {
    fn new(prompt: String, system_prompt: Option<&str>) -> Self {
        Self {
            prompt,
            system_prompt: system_prompt.map(str::to_string),
        }
    }

    pub fn into_request(self) -> GenerationRequest {
        let request = GenerationRequest::new(self.prompt);
        match self.system_prompt {
            Some(system_prompt) => request.with_system_prompt(system_prompt),
            None => request,
        }
    }
}

fn holdings_text(portfolio: &Portfolio) -> String {
    if portfolio.holdings.is_empty() {
        return "(no holdings)".to_string();
    }

    portfolio
        .holdings
        .iter()
        .map(|h| {
            format!(
                "{} ({}): {} shares, ${:.2} ({:.1}% of portfolio)",
                h.symbol,
                h.name.as_deref().unwrap_or(&h.symbol),
                h.shares,
                h.value(),
                portfolio.weight(h) * 100.0
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn portfolio_analysis(portfolio: &Portfolio, risk_profile: RiskProfile) -> PromptPair {
    let prompt = format!(
        "Analyze this investment portfolio for a {} risk investor:\n\n\
        Total Portfolio Value: ${:.2}\n\
        Cash Balance: ${:.2}\n\n\
        Holdings:\n{}\n\n\
        Provide the following:\n\
        1. Overall portfolio assessment\n\
        2. Diversification analysis\n\
        3. Risk exposure evaluation\n\
        4. Suggested improvements",
        risk_profile,
        portfolio.total_value(),
        portfolio.cash_balance,
        holdings_text(portfolio),
    );
    PromptPair::new(prompt, Some(ANALYST_PERSONA))
}

pub fn recommendations(
    risk_profile: RiskProfile,
    goals: &str,
    portfolio: &Portfolio,
    market_overview: &Value,
) -> PromptPair {
    let holdings: Map<String, Value> = portfolio
        .holdings
        .iter()
        .map(|h| {
            (
                h.symbol.clone(),
                json!({ "shares": h.shares, "costBasis": h.average_price }),
            )
        })
        .collect();

    let prompt = format!(
        "Based on the following information, recommend 3-5 investments (stocks, ETFs, or other securities) that would be suitable:\n\n\
        Risk Profile: {}\n\
        Investment Goals: {}\n\
        Current Holdings: {}\n\
        Market Overview: {}\n\n\
        Rank them from most to least suitable. For each recommendation, provide:\n\
        1. Ticker symbol\n\
        2. Why it's appropriate for this investor\n\
        3. Potential risks to be aware of\n\
        4. Suggested allocation percentage",
        risk_profile,
        goals.trim(),
        Value::Object(holdings),
        market_overview,
    );
    PromptPair::new(prompt, None)
}

pub fn chat(history: &[ChatMessage], message: &str) -> PromptPair {
    let transcript = history
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "Chat History:\n{}\n\nUser: {}\n\nAssistant:",
        transcript,
        message.trim()
    );
    PromptPair::new(prompt, Some(CHAT_PERSONA))
}

/// Percent change between the oldest and newest close in `prices` (newest first)
fn period_change(prices: &[PricePoint]) -> Option<f64> {
    let newest = prices.first()?.close;
    let oldest = prices.last()?.close;
    if prices.len() < 2 || oldest == 0.0 {
        return None;
    }
    Some((newest - oldest) / oldest * 100.0)
}

pub fn prediction(holding: &Holding, profile: &CompanyProfile, prices: &[PricePoint]) -> PromptPair {
    let window = &prices[..prices.len().min(PREDICTION_HISTORY_DAYS)];
    let trend = &window[..window.len().min(PREDICTION_TREND_POINTS)];

    let change = period_change(window)
        .map(|c| format!("{:.2}%", c))
        .unwrap_or_else(|| "n/a".to_string());
    let closes = window
        .iter()
        .map(|p| format!("{:.2}", p.close))
        .collect::<Vec<_>>()
        .join(", ");
    let pe_ratio = profile
        .pe_ratio
        .map(|pe| format!("{:.2}", pe))
        .unwrap_or_else(|| "n/a".to_string());

    let prompt = format!(
        "Analyze this stock position and provide a return prediction:\n\
        Symbol: {}\n\
        Industry: {}\n\
        Current Position: {} shares at ${:.2}\n\
        Market Cap: ${:.2}B\n\
        P/E Ratio: {}\n\n\
        Recent price trend: {}\n\
        Last {} closes (newest first): {}\n\
        {}-day change: {}\n\n\
        Provide a prediction in this format:\n\
        - Predicted return: <percent>\n\
        - Confidence: <0-1>\n\
        - Risk level: <Low/Medium/High>\n\
        - Reasoning: <brief reasoning on one line>\n\
        - Timeframe: <e.g. 3 months>",
        holding.symbol,
        profile.industry,
        holding.shares,
        holding.average_price,
        profile.market_cap,
        pe_ratio,
        serde_json::to_string(trend).unwrap_or_default(),
        window.len(),
        closes,
        window.len(),
        change,
    );
    PromptPair::new(prompt, Some(PREDICTION_PERSONA))
}

pub fn autocomplete(input: &str, context: &str, limit: usize) -> PromptPair {
    let prompt = format!(
        "Given the following context and current input, suggest up to {} relevant autocompletions.\n\n\
        Context:\n{}\n\n\
        Current user input: {}\n\n\
        Return the suggestions as a JSON array of objects with \"text\" (the completion text) and \"description\" (a brief explanation).\n\
        Only include the completion part after the current input.",
        limit, context, input,
    );
    PromptPair::new(prompt, Some(AUTOCOMPLETE_PERSONA))
}

pub fn allocation(
    risk_profile: RiskProfile,
    goals: &str,
    amount: f64,
    horizon: InvestmentHorizon,
) -> PromptPair {
    let prompt = format!(
        "Generate an optimal portfolio allocation for a retail investor with the following profile:\n\n\
        Risk Profile: {}\n\
        Investment Goals: {}\n\
        Investment Amount: ${:.2}\n\
        Time Horizon: {} term\n\n\
        Create a diversified portfolio allocation across different asset classes (stocks, ETFs, bonds, etc.).\n\
        For each asset class, specify the percentage allocation and 1-2 recommended tickers/funds.\n\
        Ensure the total allocation adds up to 100%.\n\n\
        Return the response as a JSON object with the following structure:\n\
        {{\n  \"allocation\": {{\n    \"US_LARGE_CAP\": {{ \"percentage\": 25, \"tickers\": [\"VTI\", \"SPY\"] }}\n  }},\n  \
        \"explanation\": \"A few sentences explaining the reasoning behind this allocation\"\n}}",
        risk_profile,
        goals.trim(),
        amount,
        horizon,
    );
    PromptPair::new(prompt, Some(ALLOCATION_PERSONA))
}

pub fn rebalance(portfolio: &Portfolio, risk_profile: RiskProfile) -> PromptPair {
    let prompt = format!(
        "Recommend rebalancing actions for this {} investor's portfolio:\n\n\
        Total Portfolio Value: ${:.2}\n\
        Cash Balance: ${:.2}\n\n\
        Holdings:\n{}\n\n\
        Suggest specific buy, sell, or hold actions to better align this portfolio with a {} risk profile.\n\
        For each recommendation, include the number of shares to buy/sell and a brief explanation.\n\n\
        Format your response as a JSON object with the following structure:\n\
        {{\n  \"actions\": [\n    {{ \"ticker\": \"AAPL\", \"action\": \"buy\", \"shares\": 5, \"reasoning\": \"Explanation\" }}\n  ]\n}}",
        risk_profile,
        portfolio.total_value(),
        portfolio.cash_balance,
        holdings_text(portfolio),
        risk_profile,
    );
    PromptPair::new(prompt, Some(REBALANCE_PERSONA))
}

pub fn search_intent(query: &str) -> PromptPair {
    let prompt = format!(
        "Analyze this search query from a user of an investment platform and determine their intent:\n\
        \"{}\"\n\n\
        Categorize into ONE of these intents:\n\
        1. stock_lookup - User wants information about a specific stock\n\
        2. etf_lookup - User wants information about a specific ETF\n\
        3. investment_idea - User is looking for investment ideas or strategies\n\
        4. portfolio_analysis - User wants analysis of their portfolio\n\
        5. market_news - User is looking for market news\n\
        6. educational - User wants to learn about investing concepts\n\n\
        Return ONLY the intent category name, nothing else.",
        query.trim()
    );
    PromptPair::new(prompt, None)
}

pub fn market_sentiment() -> PromptPair {
    let prompt = format!(
        "Analyze the current market sentiment and provide an overall assessment.\n\n\
        Include:\n\
        1. Overall market sentiment (bearish, neutral, or bullish)\n\
        2. Sector-specific sentiment for the following sectors: {}\n\
        3. A brief analysis of the current market conditions (1-2 paragraphs)\n\n\
        Return the data in the following JSON format WITHOUT using markdown code blocks:\n\
        {{\n  \"overall\": \"bearish\" | \"neutral\" | \"bullish\",\n  \
        \"sectors\": {{ \"Technology\": \"bearish\" | \"neutral\" | \"bullish\" }},\n  \
        \"analysis\": \"Brief analysis of market conditions\"\n}}",
        SENTIMENT_SECTORS.join(", "),
    );
    PromptPair::new(prompt, Some(SENTIMENT_PERSONA))
}

pub fn ticker_sentiment(ticker: &str) -> PromptPair {
    let prompt = format!(
        "Analyze the market sentiment for {ticker} stock.\n\n\
        Include:\n\
        1. Overall sentiment (bearish, neutral, or bullish)\n\
        2. Confidence score (0-100)\n\
        3. Key factors influencing this sentiment (4-5 bullet points)\n\n\
        Return the data in the following JSON format WITHOUT using markdown code blocks:\n\
        {{\n  \"ticker\": \"{ticker}\",\n  \"sentiment\": \"bearish\" | \"neutral\" | \"bullish\",\n  \
        \"confidenceScore\": 75,\n  \"keyFactors\": [\"Factor 1\", \"Factor 2\", \"Factor 3\", \"Factor 4\"]\n}}",
        ticker = ticker,
    );
    PromptPair::new(prompt, Some(TICKER_SENTIMENT_PERSONA))
}

pub fn market_prediction(timeframe: PredictionTimeframe) -> PromptPair {
    let horizon = timeframe.phrase();
    let prompt = format!(
        "Generate a market prediction for the {horizon}.\n\n\
        Analyze key market indicators, sentiment, and technical factors to predict:\n\
        1. Overall market outlook (bearish, neutral, or bullish)\n\
        2. Confidence score (0-100) in this prediction\n\
        3. Key drivers affecting your prediction\n\n\
        For each of these sectors, provide an outlook (bearish, neutral, or bullish), potential return range, \
        and 1-2 key stocks that might perform well in that sector:\n{sectors}\n\n\
        For these major indices, provide your prediction:\n{indices}\n\n\
        For each index, provide the current approximate value, the predicted range (low and high) for the {horizon}, \
        a confidence level (0-100) and key drivers.\n\n\
        Return the response as a JSON object WITHOUT using markdown code blocks. Use this format:\n\
        {{\n  \"marketOutlook\": \"bearish\" | \"neutral\" | \"bullish\",\n  \"confidenceScore\": number,\n  \
        \"keyDrivers\": [\"driver 1\", \"driver 2\"],\n  \
        \"sectorPredictions\": [{{ \"sector\": \"Technology\", \"outlook\": \"bullish\", \"potentialReturn\": \"-2% to +1%\", \"keyStocks\": [\"AAPL\", \"MSFT\"], \"rationale\": \"Brief explanation\" }}],\n  \
        \"majorIndexPredictions\": [{{ \"index\": \"S&P 500\", \"currentValue\": 4500, \"predictedRange\": {{ \"low\": 4400, \"high\": 4600 }}, \"confidence\": 70, \"keyDrivers\": [\"driver 1\"] }}],\n  \
        \"analysis\": \"A detailed analysis of the market prediction\"\n}}",
        horizon = horizon,
        sectors = PREDICTION_SECTORS.join(", "),
        indices = MAJOR_INDICES.join(", "),
    );
    PromptPair::new(prompt, Some(MARKET_PREDICTION_PERSONA))
}

pub fn price_prediction(ticker: &str) -> PromptPair {
    let prompt = format!(
        "Generate a detailed price prediction for {} stock.\n\n\
        Include the following in your prediction:\n\
        1. Current approximate price (best estimate)\n\
        2. Predicted prices for the next trading day, one week, one month and three months\n\
        3. Key support levels\n\
        4. Key resistance levels\n\
        5. Confidence level (0-100%)\n\
        6. Key technical factors affecting the prediction\n\
        7. Key fundamental factors affecting the prediction\n\n\
        Return your prediction as a JSON object WITHOUT using markdown code blocks. Use this format:\n\
        {{\n  \"currentPrice\": number,\n  \
        \"predictedPrices\": {{ \"oneDay\": number, \"oneWeek\": number, \"oneMonth\": number, \"threeMonths\": number }},\n  \
        \"supportLevels\": [number],\n  \"resistanceLevels\": [number],\n  \"confidence\": number,\n  \
        \"technicalFactors\": [\"factor 1\"],\n  \"fundamentalFactors\": [\"factor 1\"]\n}}",
        ticker,
    );
    PromptPair::new(prompt, Some(PRICE_PREDICTION_PERSONA))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_portfolio() -> Portfolio {
        let mut apple = Holding::new("AAPL", 10.0, 150.0);
        apple.name = Some("Apple Inc.".to_string());
        apple.current_price = Some(200.0);
        Portfolio {
            holdings: vec![apple, Holding::new("BND", 20.0, 100.0)],
            cash_balance: 0.0,
        }
    }

    #[test]
    fn test_portfolio_analysis_sections_and_persona() {
        let pair = portfolio_analysis(&sample_portfolio(), RiskProfile::Conservative);

        assert!(pair.prompt.contains("conservative risk investor"));
        assert!(pair.prompt.contains("AAPL (Apple Inc.): 10 shares, $2000.00 (50.0% of portfolio)"));
        assert!(pair.prompt.contains("BND (BND): 20 shares"));
        for section in [
            "Overall portfolio assessment",
            "Diversification analysis",
            "Risk exposure evaluation",
            "Suggested improvements",
        ] {
            assert!(pair.prompt.contains(section), "missing {}", section);
        }
        assert_eq!(pair.system_prompt.as_deref(), Some(ANALYST_PERSONA));
    }

    #[test]
    fn test_recommendations_embed_holdings_and_market() {
        let overview = json!({"SPY": {"change": 0.4}});
        let pair = recommendations(RiskProfile::Aggressive, " growth ", &sample_portfolio(), &overview);

        assert!(pair.prompt.contains("recommend 3-5 investments"));
        assert!(pair.prompt.contains("Investment Goals: growth\n"));
        assert!(pair.prompt.contains(r#""AAPL":{"costBasis":150.0,"shares":10.0}"#));
        assert!(pair.prompt.contains(r#"Market Overview: {"SPY":{"change":0.4}}"#));
        assert!(pair.prompt.contains("Suggested allocation percentage"));
        assert_eq!(pair.system_prompt, None);
    }

    #[test]
    fn test_chat_transcript() {
        let history = vec![
            ChatMessage::user("What is a bond?"),
            ChatMessage::assistant("A loan to an issuer."),
        ];
        let pair = chat(&history, "And an ETF?");

        assert!(pair
            .prompt
            .starts_with("Chat History:\nuser: What is a bond?\nassistant: A loan to an issuer.\n"));
        assert!(pair.prompt.ends_with("User: And an ETF?\n\nAssistant:"));
        let system = pair.system_prompt.unwrap();
        assert!(system.contains("disclaimers"));
        assert!(system.contains("admit it"));
    }

    #[test]
    fn test_prediction_prompt_window() {
        let prices: Vec<PricePoint> = (0..40)
            .map(|i| PricePoint {
                date: format!("day-{}", i),
                close: 110.0 - i as f64,
                volume: None,
            })
            .collect();
        let profile = CompanyProfile {
            name: "Apple Inc.".into(),
            industry: "Technology".into(),
            market_cap: 2800.0,
            pe_ratio: Some(28.5),
        };
        let pair = prediction(&Holding::new("AAPL", 10.0, 150.0), &profile, &prices);

        assert!(pair.prompt.contains("Current Position: 10 shares at $150.00"));
        assert!(pair.prompt.contains("Last 30 closes"));
        assert!(pair.prompt.contains("day-4"));
        assert!(!pair.prompt.contains("day-5\""));
        // newest 110, oldest in window 81
        assert!(pair.prompt.contains("30-day change: 35.80%"));
        assert!(pair.prompt.contains("- Confidence: <0-1>"));
    }

    #[test]
    fn test_prediction_prompt_without_history() {
        let pair = prediction(&Holding::new("XYZ", 1.0, 1.0), &CompanyProfile::default(), &[]);
        assert!(pair.prompt.contains("0-day change: n/a"));
        assert!(pair.prompt.contains("P/E Ratio: n/a"));
    }

    #[test]
    fn test_market_outlook_prompts() {
        let sentiment = market_sentiment();
        assert!(sentiment.prompt.contains("Consumer Discretionary, Energy"));
        assert!(sentiment.prompt.contains("\"overall\""));

        let ticker = ticker_sentiment("NVDA");
        assert!(ticker.prompt.contains("market sentiment for NVDA stock"));
        assert!(ticker.prompt.contains("\"ticker\": \"NVDA\""));

        let market = market_prediction(PredictionTimeframe::Quarter);
        assert!(market.prompt.contains("market prediction for the next quarter"));
        assert!(market.prompt.contains("Russell 2000"));
        assert!(market.prompt.contains("Consumer Staples"));
        assert!(market.prompt.contains("\"majorIndexPredictions\""));

        let price = price_prediction("TSLA");
        assert!(price.prompt.contains("price prediction for TSLA stock"));
        assert!(price.system_prompt.unwrap().contains("technical analyst"));
    }

    #[test]
    fn test_into_request_carries_system_prompt() {
        let request = search_intent("apple stock").into_request();
        assert!(request.prompt.contains("\"apple stock\""));
        assert_eq!(request.system_prompt, None);

        let request = autocomplete("AA", "ticker search", 5).into_request();
        assert!(request.prompt.contains("suggest up to 5"));
        assert!(request.system_prompt.unwrap().contains("valid JSON"));
    }
}
