//! Analysis Service — binds one provider at startup and holds every provider
//! to the same response contract.
//!
//! Required fields are checked here rather than in the adapters so a vendor
//! that drifts from the prompt's schema fails the same way as any other.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::analysis::models::AnalysisResponse;
use crate::config::ProviderConfig;
use crate::providers::anthropic::AnthropicProvider;
use crate::providers::gemini::GeminiProvider;
use crate::providers::mock::MockProvider;
use crate::providers::openai::OpenAiProvider;
use crate::providers::{
    build_http_client, AnalysisProvider, ProviderError, ProviderKind, RawAnalysisResult,
};

/// (snake_case key, camelCase alias) of each field that must be present.
const REQUIRED_FIELDS: [(&str, &str); 4] = [
    ("score", "score"),
    ("matching_skills", "matchingSkills"),
    ("missing_skills", "missingSkills"),
    ("recommendation", "recommendation"),
];

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Missing required field(s): {}", .0.join(", "))]
    IncompleteResult(Vec<String>),

    #[error("Invalid value for field '{field}': {reason}")]
    MalformedResult { field: &'static str, reason: String },
}

#[derive(Clone)]
pub struct AnalysisService {
    provider: Arc<dyn AnalysisProvider>,
}

impl AnalysisService {
    pub fn new(provider: Arc<dyn AnalysisProvider>) -> Self {
        Self { provider }
    }

    /// Resolves the configured provider name into a bound adapter. Missing
    /// credentials never fail startup; only HTTP client construction can.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let kind = ProviderKind::resolve(config);

        let provider: Arc<dyn AnalysisProvider> = match (kind, config.api_key.clone()) {
            (ProviderKind::Mock, _) | (_, None) => Arc::new(MockProvider::new()),
            (ProviderKind::OpenAi, Some(key)) => {
                Arc::new(OpenAiProvider::new(http_client(config)?, key, config))
            }
            (ProviderKind::Anthropic, Some(key)) => {
                Arc::new(AnthropicProvider::new(http_client(config)?, key, config))
            }
            (ProviderKind::Gemini, Some(key)) => {
                Arc::new(GeminiProvider::new(http_client(config)?, key, config))
            }
        };

        info!("AI provider selected: {}", provider.name());
        Ok(Self::new(provider))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Runs one upstream analysis and normalizes it. No caching, no retries.
    pub async fn analyze_resume(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Result<AnalysisResponse, AnalysisError> {
        info!("Starting CV analysis using {}", self.provider.name());

        let raw = self
            .provider
            .analyze(cv_text, job_description)
            .await
            .map_err(|e| {
                error!("CV analysis failed: {e}");
                AnalysisError::from(e)
            })?;

        normalize(&raw).map_err(|e| {
            error!("CV analysis failed: {e}");
            e
        })
    }
}

fn http_client(config: &ProviderConfig) -> Result<reqwest::Client> {
    build_http_client(config).context("Failed to build HTTP client for AI provider")
}

fn lookup<'a>(raw: &'a RawAnalysisResult, key: &str, alias: &str) -> Option<&'a Value> {
    raw.get(key)
        .or_else(|| raw.get(alias))
        .filter(|v| !v.is_null())
}

/// Maps a raw provider result onto the response contract.
pub fn normalize(raw: &RawAnalysisResult) -> Result<AnalysisResponse, AnalysisError> {
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|(key, alias)| lookup(raw, key, alias).is_none())
        .map(|(key, _)| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AnalysisError::IncompleteResult(missing));
    }

    let score = parse_score(lookup(raw, "score", "score"))?;
    let matching_skills = parse_required_list(
        "matching_skills",
        lookup(raw, "matching_skills", "matchingSkills"),
    )?;
    let missing_skills = parse_required_list(
        "missing_skills",
        lookup(raw, "missing_skills", "missingSkills"),
    )?;
    let recommendation = parse_recommendation(lookup(raw, "recommendation", "recommendation"))?;

    Ok(AnalysisResponse {
        score,
        matching_skills,
        missing_skills,
        recommendation,
        strengths: parse_optional_list("strengths", lookup(raw, "strengths", "strengths")),
        areas_for_improvement: parse_optional_list(
            "areas_for_improvement",
            lookup(raw, "areas_for_improvement", "areasForImprovement"),
        ),
    })
}

fn parse_score(value: Option<&Value>) -> Result<f64, AnalysisError> {
    let malformed = |reason: String| AnalysisError::MalformedResult {
        field: "score",
        reason,
    };

    let score = match value {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| malformed(format!("{n} is not representable")))?,
        Some(Value::String(s)) => s
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .map_err(|_| malformed(format!("'{s}' is not a number")))?,
        Some(other) => return Err(malformed(format!("expected a number, got {other}"))),
        None => return Err(AnalysisError::IncompleteResult(vec!["score".to_string()])),
    };

    if !score.is_finite() {
        return Err(malformed(format!("{score} is not finite")));
    }
    if !(0.0..=100.0).contains(&score) {
        warn!("Provider score {score} outside 0-100, clamping");
    }
    Ok(score.clamp(0.0, 100.0))
}

fn list_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_required_list(
    field: &'static str,
    value: Option<&Value>,
) -> Result<Vec<String>, AnalysisError> {
    match value {
        Some(Value::Array(items)) => Ok(list_items(items)),
        Some(other) => Err(AnalysisError::MalformedResult {
            field,
            reason: format!("expected a list, got {other}"),
        }),
        None => Err(AnalysisError::IncompleteResult(vec![field.to_string()])),
    }
}

fn parse_optional_list(field: &str, value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => list_items(items),
        Some(other) => {
            warn!("Ignoring '{field}': expected a list, got {other}");
            Vec::new()
        }
        None => Vec::new(),
    }
}

fn parse_recommendation(value: Option<&Value>) -> Result<String, AnalysisError> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(AnalysisError::MalformedResult {
            field: "recommendation",
            reason: "must not be empty".to_string(),
        }),
        Some(other) => Err(AnalysisError::MalformedResult {
            field: "recommendation",
            reason: format!("expected text, got {other}"),
        }),
        None => Err(AnalysisError::IncompleteResult(vec![
            "recommendation".to_string(),
        ])),
    }
}
