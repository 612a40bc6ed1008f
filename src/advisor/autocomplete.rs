// advisor/autocomplete.rs - Turn an autocomplete reply into a bounded suggestion list

use serde_json::Value;

use super::types::{AutocompleteOptions, Suggestion};
use crate::extract::extract_json;

fn to_suggestion(entry: &Value) -> Option<Suggestion> {
    let suggestion = match entry {
        Value::String(text) => Suggestion::Plain(text.trim().to_string()),
        Value::Object(fields) => Suggestion::Scored {
            text: fields.get("text")?.as_str()?.trim().to_string(),
            score: fields.get("score").and_then(Value::as_f64),
            description: fields
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        _ => return None,
    };

    (!suggestion.text().is_empty()).then_some(suggestion)
}

/// Never fails: an unparseable reply yields no suggestions
pub fn parse_suggestions(text: &str, options: &AutocompleteOptions) -> Vec<Suggestion> {
    let value = match extract_json(text) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Autocomplete: {}", e);
            return Vec::new();
        }
    };

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut fields) => match fields.remove("suggestions") {
            Some(Value::Array(entries)) => entries,
            _ => {
                tracing::warn!("Autocomplete: object reply without a suggestions array");
                return Vec::new();
            }
        },
        _ => return Vec::new(),
    };

    entries
        .iter()
        .filter_map(to_suggestion)
        .filter(|s| match (options.threshold, s.score()) {
            (Some(threshold), Some(score)) => score >= threshold,
            _ => true,
        })
        .take(options.limit)
        .collect()
}
