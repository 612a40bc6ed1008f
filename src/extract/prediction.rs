// extract/prediction.rs - Scrape prediction fields from free-text replies

use regex::Regex;
use std::sync::OnceLock;

use crate::advisor::types::{Prediction, RiskLevel, DEFAULT_TIMEFRAME};

fn return_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)return.*?(-?\d+\.?\d*)").expect("valid return regex"))
}

fn confidence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)confidence.*?(\d+\.?\d*)").expect("valid confidence regex"))
}

fn risk_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)risk.*?\b(low|medium|high)\b").expect("valid risk regex"))
}

fn reasoning_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)reasoning:?\s*([^\n]*)").expect("valid reasoning regex"))
}

fn timeframe_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)timeframe:?\s*"?([^"\n]+)"?"#).expect("valid timeframe regex"))
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn clean(value: &str) -> String {
    value
        .trim_matches(|c: char| c == '*' || c == '-' || c.is_whitespace())
        .to_string()
}

/// Never fails: missing fields fall back to 0 / 0 / Medium / "" / "3 months"
pub fn parse_prediction(symbol: &str, text: &str) -> Prediction {
    let predicted_return = capture(return_re(), text)
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0);

    let confidence = capture(confidence_re(), text)
        .and_then(|v| v.parse::<f64>().ok())
        .map(|v| if v > 1.0 && v <= 100.0 { v / 100.0 } else { v })
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);

    let risk_level = capture(risk_re(), text)
        .and_then(RiskLevel::parse)
        .unwrap_or_default();

    let reasoning = capture(reasoning_re(), text)
        .map(|line| {
            let end = line.to_ascii_lowercase().find("timeframe").unwrap_or(line.len());
            clean(&line[..end])
        })
        .unwrap_or_default();

    let timeframe = capture(timeframe_re(), text)
        .map(clean)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string());

    Prediction {
        symbol: symbol.to_string(),
        predicted_return,
        confidence,
        risk_level,
        reasoning,
        timeframe,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_reply() {
        let text = "- Predicted return: 8.5%\n\
                    - Confidence: 0.72\n\
                    - Risk level: High\n\
                    - Reasoning: Strong services growth offsets hardware softness.\n\
                    - Timeframe: 6 months";
        let prediction = parse_prediction("AAPL", text);

        assert_eq!(prediction.symbol, "AAPL");
        assert_eq!(prediction.predicted_return, 8.5);
        assert_eq!(prediction.confidence, 0.72);
        assert_eq!(prediction.risk_level, RiskLevel::High);
        assert_eq!(
            prediction.reasoning,
            "Strong services growth offsets hardware softness."
        );
        assert_eq!(prediction.timeframe, "6 months");
    }

    #[test]
    fn test_negative_return_and_percent_confidence() {
        let prediction = parse_prediction(
            "TSLA",
            "**Predicted return:** -4.25%\n**Confidence:** 65%\nRisk: LOW",
        );
        assert_eq!(prediction.predicted_return, -4.25);
        assert_eq!(prediction.confidence, 0.65);
        assert_eq!(prediction.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(parse_prediction("X", "confidence: 250").confidence, 1.0);
        assert_eq!(parse_prediction("X", "confidence: 1").confidence, 1.0);
    }

    #[test]
    fn test_reasoning_cut_before_timeframe() {
        let prediction = parse_prediction("X", "Reasoning: steady dividends timeframe: 1 year");
        assert_eq!(prediction.reasoning, "steady dividends");
        assert_eq!(prediction.timeframe, "1 year");
    }

    #[test]
    fn test_quoted_timeframe() {
        let prediction = parse_prediction("X", "Timeframe: \"12 months\"");
        assert_eq!(prediction.timeframe, "12 months");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let prediction = parse_prediction("MSFT", "The outlook is unclear.");
        assert_eq!(prediction.predicted_return, 0.0);
        assert_eq!(prediction.confidence, 0.0);
        assert_eq!(prediction.risk_level, RiskLevel::Medium);
        assert_eq!(prediction.reasoning, "");
        assert_eq!(prediction.timeframe, DEFAULT_TIMEFRAME);
    }
}
