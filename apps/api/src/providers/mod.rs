//! LLM provider adapters, one per backend, all behind `AnalysisProvider`.
//!
//! Each adapter owns its request shape and response unwrapping; every
//! real-vendor adapter runs the raw model text through `unwrap::unwrap_json`.
//! Adapters hold no per-call state and are shared across requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ProviderConfig;

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod openai;
pub mod prompts;
pub mod unwrap;

/// Untyped JSON object returned by an adapter before field validation.
pub type RawAnalysisResult = Map<String, Value>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API error (status {status}): {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{provider} returned no text content")]
    EmptyContent { provider: &'static str },

    #[error("Could not extract valid JSON from response: {preview}")]
    Unparsable { preview: String },
}

impl ProviderError {
    /// True for failures of the upstream call itself, as opposed to a reply
    /// that arrived but could not be parsed.
    pub fn is_call_failure(&self) -> bool {
        !matches!(self, ProviderError::Unparsable { .. })
    }
}

/// The single capability every backend implements.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Stable identifier used in logs and the readiness payload.
    fn name(&self) -> &'static str;

    async fn analyze(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Result<RawAnalysisResult, ProviderError>;
}

/// Known backends, resolved once from the configured provider name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
    Mock,
}

impl ProviderKind {
    /// Case-insensitive lookup; `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "anthropic" => Some(Self::Anthropic),
            "gemini" => Some(Self::Gemini),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Mock => "mock",
        }
    }

    pub fn requires_api_key(self) -> bool {
        !matches!(self, Self::Mock)
    }

    /// Picks the backend to run with. Unknown names and vendors without a
    /// credential degrade to `Mock` with a warning instead of failing startup.
    pub fn resolve(config: &ProviderConfig) -> Self {
        let Some(kind) = Self::from_name(&config.provider_name) else {
            warn!(
                "Unknown provider '{}', using mock",
                config.provider_name.trim().to_lowercase()
            );
            return Self::Mock;
        };

        if kind.requires_api_key() && !config.has_api_key() {
            warn!(
                "No API key provided for '{}', falling back to mock provider",
                kind.as_str()
            );
            return Self::Mock;
        }

        kind
    }
}

/// Model parameters shared by the real-vendor adapters.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ModelSettings {
    pub fn from_config(config: &ProviderConfig, default_model: &str) -> Self {
        Self {
            model: config
                .model_name
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Builds the outbound HTTP client with the configured request timeout.
pub fn build_http_client(config: &ProviderConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
}

/// Strips a trailing slash from a configured base URL, or uses the vendor default.
pub(crate) fn base_url(config: &ProviderConfig, default: &str) -> String {
    config
        .base_url
        .as_deref()
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

/// Error envelope used by all three vendors: `{"error": {"message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Sends a JSON request and decodes a JSON response. Non-2xx statuses
/// become `ProviderError::Api` with the vendor's message when it has one.
pub(crate) async fn send_json<B, R>(
    provider: &'static str,
    request: RequestBuilder,
    body: &B,
) -> Result<R, ProviderError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|source| ProviderError::Http { provider, source })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        warn!("{provider} API returned {status}: {message}");
        return Err(ProviderError::Api {
            provider,
            status: status.as_u16(),
            message,
        });
    }

    debug!("{provider} API returned {status}");
    response
        .json::<R>()
        .await
        .map_err(|source| ProviderError::Http { provider, source })
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    fn provider_config(name: &str, api_key: Option<&str>) -> ProviderConfig {
        let mut config = test_config().ai;
        config.provider_name = name.to_string();
        config.api_key = api_key.map(String::from);
        config
    }

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(ProviderKind::from_name("OpenAI"), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::from_name(" GEMINI "), Some(ProviderKind::Gemini));
        assert_eq!(ProviderKind::from_name("Anthropic"), Some(ProviderKind::Anthropic));
        assert_eq!(ProviderKind::from_name("mock"), Some(ProviderKind::Mock));
        assert_eq!(ProviderKind::from_name("llama"), None);
    }

    #[test]
    fn test_resolve_unknown_name_falls_back_to_mock() {
        let config = provider_config("watsonx", Some("key"));
        assert_eq!(ProviderKind::resolve(&config), ProviderKind::Mock);
    }

    #[test]
    fn test_resolve_vendor_without_key_falls_back_to_mock() {
        for name in ["openai", "anthropic", "gemini"] {
            let config = provider_config(name, None);
            assert_eq!(ProviderKind::resolve(&config), ProviderKind::Mock);
        }
    }

    #[test]
    fn test_resolve_vendor_with_key() {
        let config = provider_config("Anthropic", Some("sk-ant"));
        assert_eq!(ProviderKind::resolve(&config), ProviderKind::Anthropic);
    }

    #[test]
    fn test_model_settings_default_and_override() {
        let mut config = provider_config("openai", Some("k"));
        assert_eq!(ModelSettings::from_config(&config, "gpt-4").model, "gpt-4");
        config.model_name = Some("gpt-4o".to_string());
        assert_eq!(ModelSettings::from_config(&config, "gpt-4").model, "gpt-4o");
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let mut config = provider_config("openai", Some("k"));
        assert_eq!(base_url(&config, "https://api.openai.com"), "https://api.openai.com");
        config.base_url = Some("http://127.0.0.1:9000/".to_string());
        assert_eq!(base_url(&config, "https://api.openai.com"), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_unparsable_is_not_a_call_failure() {
        let err = ProviderError::Unparsable {
            preview: "nope".to_string(),
        };
        assert!(!err.is_call_failure());
        let err = ProviderError::EmptyContent { provider: "openai" };
        assert!(err.is_call_failure());
    }
}
