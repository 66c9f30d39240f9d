use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error Types ────────────────────────────────────────

/// Coarse classification of a failed generation, used to decide whether a
/// failure should be escalated beyond the item that hit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Auth,
    Quota,
    Transient,
    Unknown,
}

/// Substrings that mark a provider message as an auth or quota condition
/// when the provider could not classify the failure itself.
const CRITICAL_MARKERS: [&str; 2] = ["API key", "quota"];

#[derive(Debug, Clone, Error)]
pub enum ImageGenError {
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Quota exceeded: {0}")]
    Quota(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl ImageGenError {
    /// Map a non-success HTTP response from a provider onto an error variant.
    pub fn from_status(provider: &str, status: StatusCode, body: &str) -> Self {
        let message = format!("{} API Error {}: {}", provider, status, body);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ImageGenError::Auth(message),
            StatusCode::TOO_MANY_REQUESTS => ImageGenError::Quota(message),
            s if s.is_server_error() => ImageGenError::Network(message),
            _ => ImageGenError::GenerationFailed(message),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ImageGenError::Auth(_) => ErrorKind::Auth,
            ImageGenError::Quota(_) => ErrorKind::Quota,
            ImageGenError::Network(_) | ImageGenError::Unavailable(_) => ErrorKind::Transient,
            ImageGenError::ProviderNotFound(_)
            | ImageGenError::GenerationFailed(_)
            | ImageGenError::ConfigError(_) => ErrorKind::Unknown,
        }
    }

    /// Whether this failure means later generations are likely to fail too.
    ///
    /// Structured kinds win; the message markers cover providers that report
    /// auth or quota problems with a generic status code.
    pub fn is_critical(&self) -> bool {
        match self.kind() {
            ErrorKind::Auth | ErrorKind::Quota => true,
            ErrorKind::Transient | ErrorKind::Unknown => {
                let message = self.to_string();
                CRITICAL_MARKERS.iter().any(|marker| message.contains(marker))
            }
        }
    }
}

// ── Generation Parameters ──────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenParams {
    pub prompt: String,
    pub size: Option<String>,    // e.g. "1024x1024" or "16:9"
    pub quality: Option<String>, // e.g. "standard", "hd"
    pub style: Option<String>,   // e.g. "vivid", "natural"
}

impl ImageGenParams {
    pub fn for_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            size: None,
            quality: None,
            style: None,
        }
    }
}

// ── Provider Response ──────────────────────────────────

#[derive(Debug, Clone)]
pub struct ImageGenResponse {
    /// "png", "jpg"; `None` when the provider does not say.
    pub format: Option<String>,
    pub data: Vec<u8>, // Raw image bytes
}

/// A rendered image as handed back to callers: where it lives and what made it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageGenResult {
    pub image_url: String, // absolute file path
    pub prompt: String,
    pub provider_id: String,
    pub format: String,
}

// ── Provider Trait ──────────────────────────────────────

#[async_trait]
pub trait ImageGenProvider: Send + Sync {
    /// Unique identifier for this provider instance
    fn id(&self) -> String;

    /// Check if the provider is reachable/configured
    async fn is_available(&self) -> bool;

    /// Generate an image from the prompt
    async fn generate(&self, params: ImageGenParams) -> Result<ImageGenResponse, ImageGenError>;
}

/// The image service as seen by a generation session: one prompt in,
/// one stored image out.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<ImageGenResult, ImageGenError>;
}
