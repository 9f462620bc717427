//! Google Gemini `generateContent` adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::prompts::{build_analysis_prompt, ANALYSIS_SYSTEM};
use super::unwrap::unwrap_json;
use super::{send_json, AnalysisProvider, ModelSettings, ProviderError, RawAnalysisResult};
use crate::config::ProviderConfig;

const PROVIDER: &str = "gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    settings: ModelSettings,
}

impl GeminiProvider {
    pub fn new(client: Client, api_key: String, config: &ProviderConfig) -> Self {
        let settings = ModelSettings::from_config(config, DEFAULT_MODEL);
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            super::base_url(config, DEFAULT_BASE_URL),
            settings.model
        );
        info!("Gemini provider initialized with model: {}", settings.model);
        Self {
            client,
            api_key,
            endpoint,
            settings,
        }
    }
}

#[async_trait]
impl AnalysisProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn analyze(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Result<RawAnalysisResult, ProviderError> {
        let prompt = build_analysis_prompt(cv_text, job_description);
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: ANALYSIS_SYSTEM,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                max_output_tokens: self.settings.max_tokens,
                response_mime_type: "application/json",
            },
        };

        let request = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key);
        let response: GenerateResponse = send_json(PROVIDER, request, &body).await?;

        let text = response
            .text()
            .ok_or(ProviderError::EmptyContent { provider: PROVIDER })?;
        info!("Raw Gemini response length: {} chars", text.chars().count());
        debug!(
            "Raw Gemini response: {}",
            text.chars().take(500).collect::<String>()
        );

        let result = unwrap_json(&text)?;
        info!("Successfully analyzed CV with Gemini");
        Ok(result)
    }
}
