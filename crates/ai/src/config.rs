use crate::error::{AiError, Result};
use std::env;

/// Environment-based configuration for the summary client
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,

    /// Chat model id
    pub model: String,

    /// OpenAI-compatible API root
    pub base_url: String,

    pub temperature: f32,

    pub max_tokens: u32,
}

impl AiConfig {
    /// Read configuration from the environment. Only the API key is
    /// required; everything else has defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        if api_key.is_empty() || api_key == "your_openai_api_key_here" {
            return Err(AiError::MissingApiKey);
        }

        let temperature = match env::var("OPENAI_TEMPERATURE") {
            Ok(value) => value
                .parse()
                .map_err(|_| AiError::invalid_config(format!("bad OPENAI_TEMPERATURE: {value}")))?,
            Err(_) => 0.3,
        };

        let max_tokens = match env::var("OPENAI_MAX_TOKENS") {
            Ok(value) => value
                .parse()
                .map_err(|_| AiError::invalid_config(format!("bad OPENAI_MAX_TOKENS: {value}")))?,
            Err(_) => 2000,
        };

        Ok(Self {
            api_key,
            model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            temperature,
            max_tokens,
        })
    }

    /// Whether the environment is configured well enough to enable AI
    /// documentation
    pub fn available() -> bool {
        Self::from_env().is_ok()
    }
}
