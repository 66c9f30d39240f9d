//! Prompt Service — holds the active prompt provider and the batch size.

use super::config::{PromptGenConfig, PromptProviderConfig};
use super::gemini::GeminiPromptProvider;
use super::interface::{PromptGenError, PromptGenProvider, PromptGenerator, PromptRequest};
use super::openai::OpenAIPromptProvider;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct PromptService {
    provider: Arc<dyn PromptGenProvider>,
    prompt_count: usize,
}

impl PromptService {
    pub fn new(provider: Arc<dyn PromptGenProvider>, prompt_count: usize) -> Self {
        Self {
            provider,
            prompt_count: prompt_count.max(1),
        }
    }

    /// Build the active provider from config.
    pub fn from_config(config: &PromptGenConfig) -> Result<Self, PromptGenError> {
        let provider_cfg = config
            .active()
            .ok_or_else(|| PromptGenError::Config("No prompt provider configured".to_string()))?;
        let provider = build_provider(provider_cfg)?;
        info!(
            provider = %provider.id(),
            prompt_count = config.prompt_count,
            "initialized prompt provider"
        );
        Ok(Self::new(provider, config.prompt_count))
    }

    pub fn prompt_count(&self) -> usize {
        self.prompt_count
    }
}

fn build_provider(cfg: &PromptProviderConfig) -> Result<Arc<dyn PromptGenProvider>, PromptGenError> {
    match cfg.provider_type.as_str() {
        "gemini" => Ok(Arc::new(GeminiPromptProvider::new(cfg)?)),
        "openai" => Ok(Arc::new(OpenAIPromptProvider::new(cfg)?)),
        other => Err(PromptGenError::Config(format!(
            "Unknown prompt provider type: {}",
            other
        ))),
    }
}

#[async_trait]
impl PromptGenerator for PromptService {
    async fn generate_prompts(
        &self,
        article: &str,
        existing: &[String],
    ) -> Result<Vec<String>, PromptGenError> {
        let request = PromptRequest {
            article: article.to_string(),
            existing: existing.to_vec(),
            count: self.prompt_count,
        };
        let prompts = self.provider.generate(&request).await?;
        info!(
            provider = %self.provider.id(),
            existing = existing.len(),
            returned = prompts.len(),
            "generated prompts"
        );
        Ok(prompts)
    }
}
