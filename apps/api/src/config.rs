use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default, so the service can start with no `.env` at all.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub environment: String,
    pub port: u16,
    pub ai: ProviderConfig,
    pub max_file_size_mb: u64,
    pub allowed_extensions: Vec<String>,
    pub cors_origins: Vec<String>,
    pub log_level: String,
}

/// Settings consumed by the LLM provider adapters.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_name: String,
    pub api_key: Option<String>,
    /// `None` lets each vendor pick its own default model.
    pub model_name: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            app_name: env_or("APP_NAME", "SmartResume Analyzer"),
            environment: env_or("ENVIRONMENT", "development"),
            port: parse_env("PORT", 8000)?,
            ai: ProviderConfig {
                provider_name: env_or("AI_PROVIDER", "openai"),
                api_key: optional_env("AI_API_KEY"),
                model_name: optional_env("AI_MODEL"),
                max_tokens: parse_env("AI_MAX_TOKENS", 1000)?,
                temperature: parse_env("AI_TEMPERATURE", 0.3)?,
                base_url: optional_env("AI_BASE_URL"),
                timeout_secs: parse_env("AI_TIMEOUT_SECS", 120)?,
            },
            max_file_size_mb: parse_env("MAX_FILE_SIZE_MB", 10)?,
            allowed_extensions: extensions_or_default(&env_or("ALLOWED_EXTENSIONS", "pdf")),
            cors_origins: parse_list(&env_or(
                "CORS_ORIGINS",
                "http://localhost:5173,http://localhost:3000",
            )),
            log_level: env_or("LOG_LEVEL", "info").to_lowercase(),
        })
    }

    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_file_size_mb as usize).saturating_mul(1024 * 1024)
    }
}

impl ProviderConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Reads a variable, treating unset and blank values the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}

/// Splits a comma-separated setting, dropping empty items and a leading dot on extensions.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().trim_start_matches('.').to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Parses the allowed upload extensions, falling back to `pdf` when the
/// setting lists none.
fn extensions_or_default(raw: &str) -> Vec<String> {
    let extensions = parse_list(raw);
    if extensions.is_empty() {
        tracing::warn!("ALLOWED_EXTENSIONS is empty, accepting pdf uploads only");
        return vec!["pdf".to_string()];
    }
    extensions
}

#[cfg(test)]
pub fn test_config() -> Config {
    Config {
        app_name: "SmartResume Analyzer".to_string(),
        environment: "test".to_string(),
        port: 8000,
        ai: ProviderConfig {
            provider_name: "mock".to_string(),
            api_key: None,
            model_name: None,
            max_tokens: 1000,
            temperature: 0.3,
            base_url: None,
            timeout_secs: 5,
        },
        max_file_size_mb: 10,
        allowed_extensions: vec!["pdf".to_string()],
        cors_origins: vec!["http://localhost:5173".to_string()],
        log_level: "info".to_string(),
    }
}
