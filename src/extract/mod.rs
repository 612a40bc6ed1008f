// extract/mod.rs - Recover JSON from free-text model output

mod prediction;

pub use prediction::parse_prediction;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Empty response received")]
    Empty,

    #[error("Could not extract valid JSON from the response ({0} chars)")]
    NoJson(usize),

    #[error("Extracted JSON has unexpected shape: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("Incomplete data received: missing {0}")]
    Incomplete(&'static str),
}

/// Best-effort JSON extraction. Strategies run in order, first success wins:
/// whole text, first top-level array, first top-level object, fence-stripped slice.
pub fn extract_json(text: &str) -> Result<Value, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }
    tracing::debug!("Direct JSON parsing failed, trying bracket extraction");

    let spans = top_level_spans(text);

    for opener in ['[', '{'] {
        for (start, end) in spans.iter().filter(|(start, _)| text[*start..].starts_with(opener)) {
            if let Ok(value) = serde_json::from_str::<Value>(&text[*start..*end]) {
                return Ok(value);
            }
        }
    }

    if let Some(value) = parse_fenced_slice(text) {
        return Ok(value);
    }

    tracing::warn!("Failed to extract any valid JSON from {} chars", text.len());
    Err(ParseError::NoJson(text.len()))
}

/// [`extract_json`] followed by deserialization into `T`
pub fn extract_json_as<T: DeserializeOwned>(text: &str) -> Result<T, ParseError> {
    let value = extract_json(text)?;
    Ok(serde_json::from_value(value)?)
}

/// Remove markdown code fences, keeping their contents
pub fn strip_code_fences(text: &str) -> String {
    static FENCE_RE: OnceLock<Regex> = OnceLock::new();
    let re = FENCE_RE.get_or_init(|| Regex::new(r"```[A-Za-z0-9_+-]*").expect("valid fence regex"));
    re.replace_all(text, "").trim().to_string()
}

fn parse_fenced_slice(text: &str) -> Option<Value> {
    let cleaned = strip_code_fences(text);
    let start = cleaned.find(|c: char| c == '[' || c == '{')?;
    let end = cleaned.rfind(|c: char| c == ']' || c == '}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&cleaned[start..=end]).ok()
}

/// Byte ranges of balanced `[...]` / `{...}` literals that are not nested in
/// another literal. Brackets inside JSON strings are ignored; prose outside
/// any literal is not treated as string content. An opener that is never
/// closed is skipped and the scan resumes right after it.
fn top_level_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut from = 0;
    while let Some(unclosed) = scan_spans(text, from, &mut spans) {
        // Openers are ASCII
        from = unclosed + 1;
    }
    spans
}

/// Scan `text[from..]`, pushing complete spans. Returns the offset of the
/// outermost opener still open at the end of the text.
fn scan_spans(text: &str, from: usize, spans: &mut Vec<(usize, usize)>) -> Option<usize> {
    let mut stack: Vec<char> = Vec::new();
    let mut start = from;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[from..].char_indices() {
        let idx = from + offset;

        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' if !stack.is_empty() => in_string = true,
            '[' | '{' => {
                if stack.is_empty() {
                    start = idx;
                }
                stack.push(ch);
            }
            ']' | '}' if !stack.is_empty() => {
                let expected = if ch == ']' { '[' } else { '{' };
                if stack.last() == Some(&expected) {
                    stack.pop();
                    if stack.is_empty() {
                        spans.push((start, idx + ch.len_utf8()));
                    }
                } else {
                    // Mismatched closer: abandon this candidate
                    stack.clear();
                }
            }
            _ => {}
        }
    }

    (!stack.is_empty()).then_some(start)
}
