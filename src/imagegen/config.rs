use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ── Provider Config ────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenProviderConfig {
    pub id: String,
    pub provider_type: String, // "google", "openai"
    #[serde(default = "default_true")]
    pub enabled: bool,

    // Common fields
    pub api_key: Option<String>,
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,   // e.g. "imagen-3.0-generate-002", "dall-e-3"
    pub size: Option<String>,    // e.g. "1024x1024", "16:9"
    pub quality: Option<String>, // e.g. "standard", "hd"
    pub style: Option<String>,   // e.g. "vivid", "natural"

    /// Catch-all for provider-specific config
    #[serde(default)]
    pub extra: HashMap<String, Value>,
}

impl ImageGenProviderConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        crate::config::resolve_api_key(&self.api_key, &self.api_key_env)
    }
}

fn default_true() -> bool {
    true
}

// ── System Config ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenSystemConfig {
    #[serde(default)]
    pub default_provider: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub providers: Vec<ImageGenProviderConfig>,
}

impl Default for ImageGenSystemConfig {
    fn default() -> Self {
        Self {
            default_provider: Some("google".to_string()),
            enabled: true,
            providers: vec![
                ImageGenProviderConfig {
                    id: "google".to_string(),
                    provider_type: "google".to_string(),
                    enabled: true,
                    api_key: None,
                    api_key_env: Some("GEMINI_API_KEY".to_string()),
                    base_url: None,
                    model: Some("imagen-3.0-generate-002".to_string()),
                    size: Some("16:9".to_string()), // blog header friendly
                    quality: None,
                    style: None,
                    extra: HashMap::new(),
                },
                ImageGenProviderConfig {
                    id: "openai".to_string(),
                    provider_type: "openai".to_string(),
                    enabled: false, // Disabled by default
                    api_key: None,
                    api_key_env: Some("OPENAI_API_KEY".to_string()),
                    base_url: None,
                    model: Some("dall-e-3".to_string()),
                    size: Some("1792x1024".to_string()),
                    quality: Some("standard".to_string()),
                    style: Some("vivid".to_string()),
                    extra: HashMap::new(),
                },
            ],
        }
    }
}
