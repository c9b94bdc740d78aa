use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum LLMProvider {
    Local,
    OpenAI,
    Gemini,
    Ollama,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::OpenAI,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            max_tokens: Some(1024),
            temperature: Some(0.7),
        }
    }
}

impl LLMConfig {
    /// Copy of this config with the temperature pinned, used for the SQL
    /// generation call which must stay deterministic.
    pub fn with_temperature(&self, temperature: f32) -> Self {
        let mut config = self.clone();
        config.temperature = Some(temperature);
        config
    }
}
