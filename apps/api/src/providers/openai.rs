//! OpenAI chat-completions adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::prompts::{build_analysis_prompt, ANALYSIS_SYSTEM};
use super::unwrap::unwrap_json;
use super::{send_json, AnalysisProvider, ModelSettings, ProviderError, RawAnalysisResult};
use crate::config::ProviderConfig;

const PROVIDER: &str = "openai";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    settings: ModelSettings,
}

impl OpenAiProvider {
    pub fn new(client: Client, api_key: String, config: &ProviderConfig) -> Self {
        let endpoint = format!(
            "{}/v1/chat/completions",
            super::base_url(config, DEFAULT_BASE_URL)
        );
        let settings = ModelSettings::from_config(config, DEFAULT_MODEL);
        info!("OpenAI provider initialized with model: {}", settings.model);
        Self {
            client,
            api_key,
            endpoint,
            settings,
        }
    }
}

#[async_trait]
impl AnalysisProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn analyze(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Result<RawAnalysisResult, ProviderError> {
        let prompt = build_analysis_prompt(cv_text, job_description);
        let body = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: ANALYSIS_SYSTEM,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key);
        let response: ChatResponse = send_json(PROVIDER, request, &body).await?;

        let text = response
            .text()
            .ok_or(ProviderError::EmptyContent { provider: PROVIDER })?;
        let result = unwrap_json(text)?;
        info!("Successfully analyzed CV with OpenAI");
        Ok(result)
    }
}
