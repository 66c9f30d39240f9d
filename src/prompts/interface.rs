//! Prompt generation traits: the provider-facing backend interface and the
//! article-level seam a generation session depends on.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptGenError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Prompt service error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Could not read prompts from response: {0}")]
    Parse(String),
    #[error("The prompt service returned no prompts")]
    Empty,
}

/// One request to turn an article into illustration prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub article: String,
    /// Prompts produced by earlier requests; the model is asked not to repeat them.
    pub existing: Vec<String>,
    pub count: usize,
}

/// Common interface for prompt backends (Gemini, OpenAI-compatible).
#[async_trait]
pub trait PromptGenProvider: Send + Sync {
    async fn generate(&self, request: &PromptRequest) -> Result<Vec<String>, PromptGenError>;

    /// Provider identifier (e.g. "gemini", "openai").
    fn id(&self) -> &str;
}

/// The prompt service as seen by a generation session.
#[async_trait]
pub trait PromptGenerator: Send + Sync {
    async fn generate_prompts(
        &self,
        article: &str,
        existing: &[String],
    ) -> Result<Vec<String>, PromptGenError>;
}
