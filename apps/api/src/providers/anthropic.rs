//! Anthropic Messages API adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::prompts::{build_analysis_prompt, ANALYSIS_SYSTEM};
use super::unwrap::unwrap_json;
use super::{send_json, AnalysisProvider, ModelSettings, ProviderError, RawAnalysisResult};
use crate::config::ProviderConfig;

const PROVIDER: &str = "anthropic";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicResponse {
    /// Text of the first text block.
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    settings: ModelSettings,
}

impl AnthropicProvider {
    pub fn new(client: Client, api_key: String, config: &ProviderConfig) -> Self {
        let endpoint = format!("{}/v1/messages", super::base_url(config, DEFAULT_BASE_URL));
        let settings = ModelSettings::from_config(config, DEFAULT_MODEL);
        info!("Anthropic provider initialized with model: {}", settings.model);
        Self {
            client,
            api_key,
            endpoint,
            settings,
        }
    }
}

#[async_trait]
impl AnalysisProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn analyze(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Result<RawAnalysisResult, ProviderError> {
        let prompt = build_analysis_prompt(cv_text, job_description);
        let body = AnthropicRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            system: ANALYSIS_SYSTEM,
            messages: vec![AnthropicMessage {
                role: "user",
                content: &prompt,
            }],
        };

        let request = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);
        let response: AnthropicResponse = send_json(PROVIDER, request, &body).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Anthropic call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }

        let text = response
            .text()
            .ok_or(ProviderError::EmptyContent { provider: PROVIDER })?;
        let result = unwrap_json(text)?;
        info!("Successfully analyzed CV with Anthropic");
        Ok(result)
    }
}
