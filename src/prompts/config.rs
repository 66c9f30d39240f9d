//! Prompt service configuration — one section of the weaver config file.

use crate::config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptProviderConfig {
    pub id: String,
    /// "gemini" | "openai"
    pub provider_type: String,
    #[serde(default = "default_true")]
    pub enabled: bool,

    pub api_key: Option<String>,
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

impl PromptProviderConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        config::resolve_api_key(&self.api_key, &self.api_key_env)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptGenConfig {
    /// ID of the active provider (must match one of `providers[].id`).
    #[serde(default = "default_active_provider")]
    pub active_provider: String,

    /// How many prompts each request asks for.
    #[serde(default = "default_prompt_count")]
    pub prompt_count: usize,

    #[serde(default = "default_providers")]
    pub providers: Vec<PromptProviderConfig>,
}

fn default_active_provider() -> String {
    "gemini".to_string()
}

fn default_prompt_count() -> usize {
    5
}

fn default_providers() -> Vec<PromptProviderConfig> {
    vec![
        PromptProviderConfig {
            id: "gemini".to_string(),
            provider_type: "gemini".to_string(),
            enabled: true,
            api_key: None,
            api_key_env: Some("GEMINI_API_KEY".to_string()),
            base_url: None,
            model: Some("gemini-2.5-flash".to_string()),
            temperature: None,
        },
        PromptProviderConfig {
            id: "openai".to_string(),
            provider_type: "openai".to_string(),
            enabled: false,
            api_key: None,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            base_url: Some("https://api.openai.com/v1".to_string()),
            model: Some("gpt-4o-mini".to_string()),
            temperature: None,
        },
    ]
}

impl Default for PromptGenConfig {
    fn default() -> Self {
        Self {
            active_provider: default_active_provider(),
            prompt_count: default_prompt_count(),
            providers: default_providers(),
        }
    }
}

impl PromptGenConfig {
    /// The active provider entry, or the first enabled one.
    pub fn active(&self) -> Option<&PromptProviderConfig> {
        self.providers
            .iter()
            .find(|p| p.id == self.active_provider)
            .or_else(|| self.providers.iter().find(|p| p.enabled))
    }
}
