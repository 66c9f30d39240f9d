use crate::imagegen::config::ImageGenProviderConfig;
use crate::imagegen::{ImageGenError, ImageGenParams, ImageGenProvider, ImageGenResponse};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

pub struct OpenAIImageGenProvider {
    id: String,
    api_key: String,
    base_url: String, // Defaults to "https://api.openai.com/v1"
    model: String,    // Defaults to "dall-e-3"
    size: String,
    quality: Option<String>,
    style: Option<String>,
    client: Client,
}

impl OpenAIImageGenProvider {
    pub fn new(config: &ImageGenProviderConfig) -> Result<Self, ImageGenError> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| ImageGenError::ConfigError("OpenAI API Key is required".to_string()))?;
        Ok(Self {
            id: config.id.clone(),
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: config.model.clone().unwrap_or_else(|| "dall-e-3".to_string()),
            size: config.size.clone().unwrap_or_else(|| "1024x1024".to_string()),
            quality: config.quality.clone(),
            style: config.style.clone(),
            client: Client::new(),
        })
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    prompt: String,
    n: usize,
    size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<String>,
    response_format: String, // Always "b64_json"
}

#[async_trait]
impl ImageGenProvider for OpenAIImageGenProvider {
    fn id(&self) -> String {
        self.id.clone()
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate(&self, params: ImageGenParams) -> Result<ImageGenResponse, ImageGenError> {
        let url = format!("{}/images/generations", self.base_url.trim_end_matches('/'));

        let body = OpenAIRequest {
            model: self.model.clone(),
            prompt: params.prompt,
            n: 1, // DALL-E 3 only supports n=1
            size: params.size.unwrap_or_else(|| self.size.clone()),
            quality: params.quality.or_else(|| self.quality.clone()),
            style: params.style.or_else(|| self.style.clone()),
            response_format: "b64_json".to_string(),
        };

        let res = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ImageGenError::Network(e.without_url().to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let text = res
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ImageGenError::from_status("OpenAI", status, &text));
        }

        let json: Value = res
            .json()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(format!("Invalid JSON: {}", e)))?;

        // Response format: { "created": ..., "data": [ { "b64_json": "..." } ] }
        let b64 = json
            .get("data")
            .and_then(|v| v.as_array())
            .and_then(|data| data.first())
            .and_then(|first| first.get("b64_json"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ImageGenError::GenerationFailed("Response missing 'data[0].b64_json'".to_string())
            })?;

        let bytes = general_purpose::STANDARD
            .decode(b64)
            .map_err(|e| ImageGenError::GenerationFailed(format!("Base64 decode error: {}", e)))?;

        Ok(ImageGenResponse {
            format: Some("png".to_string()), // DALL-E returns PNG
            data: bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> OpenAIImageGenProvider {
        OpenAIImageGenProvider::new(&ImageGenProviderConfig {
            id: "openai".to_string(),
            provider_type: "openai".to_string(),
            enabled: true,
            api_key: Some("sk-test".to_string()),
            api_key_env: None,
            base_url: Some(base_url.to_string()),
            model: None,
            size: None,
            quality: Some("hd".to_string()),
            style: None,
            extra: HashMap::new(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_sends_config_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "dall-e-3",
                "size": "1024x1024",
                "quality": "hd",
                "response_format": "b64_json"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "created": 1,
                "data": [{ "b64_json": general_purpose::STANDARD.encode(b"img") }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server.uri())
            .generate(ImageGenParams::for_prompt("a quiet harbor"))
            .await
            .unwrap();
        assert_eq!(response.data, b"img");
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Incorrect API key provided"))
            .mount(&server)
            .await;

        let err = provider(&server.uri())
            .generate(ImageGenParams::for_prompt("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageGenError::Auth(_)));
        assert!(err.is_critical());
    }

    #[tokio::test]
    async fn test_missing_payload_is_generation_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let err = provider(&server.uri())
            .generate(ImageGenParams::for_prompt("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageGenError::GenerationFailed(_)));
    }
}
