use super::config::PromptProviderConfig;
use super::instructions::{build_user_message, parse_prompt_list, PROMPT_WRITER_SYSTEM_PROMPT};
use super::interface::{PromptGenError, PromptGenProvider, PromptRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Any OpenAI-compatible `chat/completions` endpoint.
pub struct OpenAIPromptProvider {
    id: String,
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
}

impl OpenAIPromptProvider {
    pub fn new(config: &PromptProviderConfig) -> Result<Self, PromptGenError> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| PromptGenError::Config("OpenAI API Key is required".to_string()))?;
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
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: config.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string()),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl PromptGenProvider for OpenAIPromptProvider {
    async fn generate(&self, request: &PromptRequest) -> Result<Vec<String>, PromptGenError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: PROMPT_WRITER_SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: build_user_message(request),
                },
            ],
            stream: false,
            temperature: self.temperature.or(Some(0.8)),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| PromptGenError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PromptGenError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PromptGenError::Parse(e.to_string()))?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("");
        if content.trim().is_empty() {
            return Err(PromptGenError::Empty);
        }
        parse_prompt_list(content)
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> OpenAIPromptProvider {
        OpenAIPromptProvider::new(&PromptProviderConfig {
            id: "openai".to_string(),
            provider_type: "openai".to_string(),
            enabled: true,
            api_key: Some("sk-test".to_string()),
            api_key_env: None,
            base_url: Some(base_url.to_string()),
            model: None,
            temperature: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_parses_object_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "{\"prompts\": [\"C\", \"D\"]}" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let prompts = provider(&server.uri())
            .generate(&PromptRequest {
                article: "text".to_string(),
                existing: vec!["A".to_string(), "B".to_string()],
                count: 2,
            })
            .await
            .unwrap();
        assert_eq!(prompts, vec!["C", "D"]);
    }

    #[tokio::test]
    async fn test_http_failure_keeps_body_as_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let err = provider(&server.uri())
            .generate(&PromptRequest {
                article: "text".to_string(),
                existing: vec![],
                count: 5,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Prompt service error 500: upstream exploded");
    }
}
