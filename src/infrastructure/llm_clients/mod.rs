pub mod gemini;
pub mod openai;

use crate::domain::error::Result;
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use async_trait::async_trait;
use gemini::GeminiClient;
use openai::OpenAIClient;

/// Chat collaborator: system instructions and user content in, free text
/// out. Stateless; the pipeline owns prompt construction and parsing.
#[async_trait]
pub trait LLMClient: Send + Sync {
    async fn generate(&self, config: &LLMConfig, system: &str, user: &str) -> Result<String>;
}

pub struct RouterClient {
    openai: OpenAIClient,
    gemini: GeminiClient,
}

impl RouterClient {
    pub fn new() -> Self {
        Self {
            openai: OpenAIClient::new(),
            gemini: GeminiClient::new(),
        }
    }
}

impl Default for RouterClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for RouterClient {
    async fn generate(&self, config: &LLMConfig, system: &str, user: &str) -> Result<String> {
        match config.provider {
            LLMProvider::Gemini => self.gemini.generate(config, system, user).await,
            // Local and Ollama endpoints speak the OpenAI chat shape.
            _ => self.openai.generate(config, system, user).await,
        }
    }
}
