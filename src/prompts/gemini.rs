use super::config::PromptProviderConfig;
use super::instructions::{build_user_message, parse_prompt_list, PROMPT_WRITER_SYSTEM_PROMPT};
use super::interface::{PromptGenError, PromptGenProvider, PromptRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini `generateContent` with a JSON response schema of `string[]`.
pub struct GeminiPromptProvider {
    id: String,
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
}

impl GeminiPromptProvider {
    pub fn new(config: &PromptProviderConfig) -> Result<Self, PromptGenError> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| PromptGenError::Config("Gemini API Key is required".to_string()))?;
        Ok(Self {
            id: config.id.clone(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: config
                .model
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl PromptGenProvider for GeminiPromptProvider {
    async fn generate(&self, request: &PromptRequest) -> Result<Vec<String>, PromptGenError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let mut generation_config = json!({
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }
        });
        if let Some(temperature) = self.temperature {
            generation_config["temperature"] = json!(temperature);
        }

        let body = json!({
            "systemInstruction": { "parts": [{ "text": PROMPT_WRITER_SYSTEM_PROMPT }] },
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_user_message(request) }]
            }],
            "generationConfig": generation_config
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PromptGenError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&error_text)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(error_text);
            return Err(PromptGenError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PromptGenError::Parse(e.to_string()))?;

        // Structure: { "candidates": [ { "content": { "parts": [ { "text": "[...]" } ] } } ] }
        let text: String = body["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(PromptGenError::Empty);
        }
        debug!(model = %self.model, chars = text.len(), "gemini prompt response");
        parse_prompt_list(&text)
    }

    fn id(&self) -> &str {
        &self.id
    }
}
