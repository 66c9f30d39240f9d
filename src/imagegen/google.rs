use crate::imagegen::config::ImageGenProviderConfig;
use crate::imagegen::interface::{ImageGenError, ImageGenParams, ImageGenProvider, ImageGenResponse};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, StatusCode};
use serde_json::{json, Map, Value};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "imagen-3.0-generate-002";

/// Imagen through the Generative Language `:predict` endpoint.
pub struct GoogleImageGenProvider {
    id: String,
    api_key: String,
    base_url: String,
    model: String,
    aspect_ratio: &'static str,
    extra: Map<String, Value>,
    client: Client,
}

impl GoogleImageGenProvider {
    pub fn new(config: &ImageGenProviderConfig) -> Result<Self, ImageGenError> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| ImageGenError::ConfigError("Google API Key is required".to_string()))?;

        // If empty string provided, fall back to default
        let model = config
            .model
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            id: config.id.clone(),
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model,
            aspect_ratio: aspect_ratio_for(config.size.as_deref()),
            extra: config.extra.clone().into_iter().collect(),
            client: Client::new(),
        })
    }
}

/// Imagen only accepts a fixed set of aspect ratios.
fn aspect_ratio_for(size: Option<&str>) -> &'static str {
    match size {
        Some("16:9") | Some("1792x1024") => "16:9",
        Some("9:16") | Some("1024x1792") => "9:16",
        Some("3:4") => "3:4",
        Some("4:3") => "4:3",
        _ => "1:1",
    }
}

/// Google wraps failures as `{ "error": { "message", "status" } }`; the
/// `status` string is more precise than the HTTP code (a bad key is a 400).
fn classify_error(status: StatusCode, body: &str) -> ImageGenError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or(body);
    match error.and_then(|e| e.get("status")).and_then(|s| s.as_str()) {
        Some("UNAUTHENTICATED") | Some("PERMISSION_DENIED") => {
            ImageGenError::Auth(format!("Google API Error {}: {}", status, message))
        }
        Some("RESOURCE_EXHAUSTED") => {
            ImageGenError::Quota(format!("Google API Error {}: {}", status, message))
        }
        _ => ImageGenError::from_status("Google", status, message),
    }
}

#[async_trait]
impl ImageGenProvider for GoogleImageGenProvider {
    fn id(&self) -> String {
        self.id.clone()
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate(&self, params: ImageGenParams) -> Result<ImageGenResponse, ImageGenError> {
        let url = format!(
            "{}/models/{}:predict",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let aspect_ratio = match params.size.as_deref() {
            Some(size) => aspect_ratio_for(Some(size)),
            None => self.aspect_ratio,
        };

        let mut parameters = Map::new();
        parameters.insert("sampleCount".to_string(), json!(1));
        parameters.insert("aspectRatio".to_string(), json!(aspect_ratio));
        parameters.insert("outputOptions".to_string(), json!({ "mimeType": "image/png" }));
        for (key, value) in &self.extra {
            parameters.insert(key.clone(), value.clone());
        }

        let body = json!({
            "instances": [
                {
                    "prompt": params.prompt
                }
            ],
            "parameters": parameters
        });

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ImageGenError::Network(e.without_url().to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let error_text = res.text().await.unwrap_or_default();
            return Err(classify_error(status, &error_text));
        }

        let json: Value = res
            .json()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(format!("JSON Error: {}", e)))?;

        // Structure: { "predictions": [ { "bytesBase64Encoded": "...", "mimeType": "image/png" } ] }
        let first_prediction = json
            .get("predictions")
            .and_then(|v| v.as_array())
            .and_then(|p| p.first())
            .ok_or_else(|| {
                ImageGenError::GenerationFailed(
                    "No predictions returned (the prompt may have been filtered)".to_string(),
                )
            })?;

        let b64_data = first_prediction
            .get("bytesBase64Encoded")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ImageGenError::GenerationFailed("Missing 'bytesBase64Encoded' field".to_string())
            })?;

        let image_data = general_purpose::STANDARD
            .decode(b64_data)
            .map_err(|e| ImageGenError::GenerationFailed(format!("Base64 decode failed: {}", e)))?;

        let format = first_prediction
            .get("mimeType")
            .and_then(|v| v.as_str())
            .and_then(|mime| mime.strip_prefix("image/"))
            .map(|ext| if ext == "jpeg" { "jpg".to_string() } else { ext.to_string() });

        Ok(ImageGenResponse {
            data: image_data,
            format,
        })
    }
}
