use super::LLMClient;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use serde_json::json;

pub struct OpenAIClient {
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

impl Default for OpenAIClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate(&self, config: &LLMConfig, system: &str, user: &str) -> Result<String> {
        let url = if config.base_url.ends_with('/') {
            format!("{}chat/completions", config.base_url)
        } else {
            format!("{}/chat/completions", config.base_url)
        };

        let body = json!({
            "model": config.model,
            "messages": [
                {
                    "role": "system",
                    "content": system
                },
                {
                    "role": "user",
                    "content": user
                }
            ],
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
        });

        let mut request = self.client.post(&url);
        if let Some(api_key) = &config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to parse JSON: {}", e)))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Provider("Invalid response format".to_string()))
    }
}
