//! Best-effort recovery of a JSON object from free-form model text.
//!
//! Models are asked for bare JSON but often wrap it in a markdown fence or
//! surround it with prose. Strategies run in order and the first one that
//! yields a JSON object wins.

use serde_json::{Map, Value};
use tracing::debug;

use super::{ProviderError, RawAnalysisResult};

/// Characters of raw text kept in an `Unparsable` error.
const PREVIEW_CHARS: usize = 200;

type Strategy = fn(&str) -> Option<RawAnalysisResult>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("direct", parse_direct),
    ("fenced_block", parse_fenced_block),
    ("brace_span", parse_brace_span),
];

/// Runs the unwrap chain over `text`, failing with a truncated preview.
pub fn unwrap_json(text: &str) -> Result<RawAnalysisResult, ProviderError> {
    for (name, strategy) in STRATEGIES {
        if let Some(object) = strategy(text) {
            debug!("Recovered JSON from model output via {name} strategy");
            return Ok(object);
        }
    }

    Err(ProviderError::Unparsable {
        preview: text.chars().take(PREVIEW_CHARS).collect(),
    })
}

fn parse_object(candidate: &str) -> Option<RawAnalysisResult> {
    serde_json::from_str::<Map<String, Value>>(candidate.trim()).ok()
}

fn parse_direct(text: &str) -> Option<RawAnalysisResult> {
    parse_object(text)
}

/// Body of the first ```` ```json ```` (or bare ```` ``` ````) fence, up to the
/// next fence or the end of the text.
fn parse_fenced_block(text: &str) -> Option<RawAnalysisResult> {
    let start = match text.find("```json") {
        Some(idx) => idx + "```json".len(),
        None => text.find("```")? + "```".len(),
    };
    let rest = &text[start..];
    let end = rest.find("```").unwrap_or(rest.len());
    parse_object(&rest[..end])
}

/// Span from the first `{` to the last `}`.
fn parse_brace_span(text: &str) -> Option<RawAnalysisResult> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&text[start..=end])
}
