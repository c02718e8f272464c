use thiserror::Error;

/// Result type for AI operations
pub type Result<T> = std::result::Result<T, AiError>;

#[derive(Error, Debug)]
pub enum AiError {
    /// OPENAI_API_KEY is unset or still the placeholder value
    #[error("OPENAI_API_KEY is not configured")]
    MissingApiKey,

    #[error("Invalid AI configuration: {0}")]
    InvalidConfig(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success status from the completions endpoint
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model returned an empty response")]
    EmptyResponse,
}

impl AiError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
