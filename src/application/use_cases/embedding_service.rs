use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Maps a cleaned text string to a fixed-length vector.
///
/// Deterministic for identical input text. Callers must pre-normalize with
/// `text_cleaner::normalize_key`; this layer embeds what it is given.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Debug, Serialize)]
struct OpenAIEmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct GeminiEmbeddingRequest {
    content: GeminiEmbeddingContent,
}

#[derive(Debug, Serialize)]
struct GeminiEmbeddingContent {
    parts: Vec<GeminiEmbeddingPart>,
}

#[derive(Debug, Serialize)]
struct GeminiEmbeddingPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbeddingResponse {
    embedding: GeminiEmbeddingResult,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbeddingResult {
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

pub struct EmbeddingService {
    client: Client,
    config: LLMConfig,
    local_embedder: Mutex<Option<TextEmbedding>>,
}

impl EmbeddingService {
    pub fn new(config: LLMConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| Client::new()),
            config,
            local_embedder: Mutex::new(None),
        }
    }

    fn resolve_gemini_embedding_model(model: &str) -> String {
        let trimmed = model.trim().trim_start_matches("models/");
        if trimmed.contains("embedding") {
            trimmed.to_string()
        } else {
            "text-embedding-004".to_string()
        }
    }

    fn resolve_local_embedding_model(model: &str) -> EmbeddingModel {
        match model.trim().to_lowercase().as_str() {
            "all-minilm-l6-v2" => EmbeddingModel::AllMiniLML6V2,
            _ => EmbeddingModel::AllMiniLML6V2,
        }
    }

    pub async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        match self.config.provider {
            LLMProvider::Local => self.generate_local_embedding(text),
            LLMProvider::OpenAI => self.generate_openai_embedding(text).await,
            LLMProvider::Gemini => self.generate_gemini_embedding(text).await,
            LLMProvider::Ollama => self.generate_ollama_embedding(text).await,
        }
    }

    fn generate_local_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let model = Self::resolve_local_embedding_model(&self.config.model);
        let mut guard = self.local_embedder.lock().unwrap();
        if guard.is_none() {
            let mut options = InitOptions::default();
            options.model_name = model;
            let embedder = TextEmbedding::try_new(options)
                .map_err(|e| AppError::Provider(format!("Failed to init local embedder: {}", e)))?;
            *guard = Some(embedder);
        }
        let embedder = guard
            .as_ref()
            .ok_or_else(|| AppError::Provider("Local embedder unavailable".to_string()))?;
        let embeddings = embedder
            .embed(vec![text.to_string()], None)
            .map_err(|e| AppError::Provider(format!("Failed to embed text: {}", e)))?;
        let embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Provider("Empty embedding response".to_string()))?;
        if embedding.is_empty() {
            return Err(AppError::Provider("Empty embedding response".to_string()));
        }
        Ok(embedding)
    }

    async fn generate_openai_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let url = if self.config.base_url.ends_with('/') {
            format!("{}embeddings", self.config.base_url)
        } else {
            format!("{}/embeddings", self.config.base_url)
        };

        let request = OpenAIEmbeddingRequest {
            model: self.config.model.clone(),
            input: text.to_string(),
        };

        let mut req = self.client.post(&url);
        if let Some(api_key) = &self.config.api_key {
            req = req.bearer_auth(api_key);
        }

        let response = req
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::Provider(format!("Failed to call embedding API ({}): {}", url, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Provider(format!(
                "Embedding API returned error {} (URL: {}): {}",
                status, url, error_text
            )));
        }

        let embedding_response: OpenAIEmbeddingResponse = response.json().await.map_err(|e| {
            AppError::Provider(format!("Failed to parse embedding response: {}", e))
        })?;

        let embedding = embedding_response
            .data
            .first()
            .map(|d| d.embedding.clone())
            .ok_or_else(|| AppError::Provider("No embedding data in response".to_string()))?;

        if embedding.is_empty() {
            return Err(AppError::Provider("Empty embedding response".to_string()));
        }

        Ok(embedding)
    }

    async fn generate_gemini_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let api_key = self
            .config
            .api_key
            .clone()
            .ok_or_else(|| AppError::Provider("Missing API key for Gemini provider".to_string()))?;
        let mut base_url = self.config.base_url.trim_end_matches('/').to_string();
        if !base_url.ends_with("/models") {
            base_url = format!("{}/models", base_url);
        }
        let model_id = Self::resolve_gemini_embedding_model(&self.config.model);
        let url = format!("{}/{}:embedContent?key={}", base_url, model_id, api_key);

        let request = GeminiEmbeddingRequest {
            content: GeminiEmbeddingContent {
                parts: vec![GeminiEmbeddingPart {
                    text: text.to_string(),
                }],
            },
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::Provider(format!("Failed to call embedding API ({}): {}", url, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Provider(format!(
                "Embedding API returned error {} (URL: {}): {}",
                status, url, error_text
            )));
        }

        let embedding_response: GeminiEmbeddingResponse = response.json().await.map_err(|e| {
            AppError::Provider(format!("Failed to parse embedding response: {}", e))
        })?;

        let embedding = embedding_response.embedding.values;
        if embedding.is_empty() {
            return Err(AppError::Provider("Empty embedding response".to_string()));
        }

        Ok(embedding)
    }

    async fn generate_ollama_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let mut url = self.config.base_url.clone();

        if url.ends_with("/v1") || url.ends_with("/v1/") {
            url = url.trim_end_matches("/v1").to_string();
            url = url.trim_end_matches('/').to_string();
        }

        url = if url.ends_with('/') {
            format!("{}api/embeddings", url)
        } else {
            format!("{}/api/embeddings", url)
        };

        let request = OllamaEmbeddingRequest {
            model: self.config.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::Provider(format!("Failed to call embedding API ({}): {}", url, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Provider(format!(
                "Embedding API returned error {} (URL: {}): {}",
                status, url, error_text
            )));
        }

        let embedding_response: OllamaEmbeddingResponse = response.json().await.map_err(|e| {
            AppError::Provider(format!("Failed to parse embedding response: {}", e))
        })?;

        let embedding = embedding_response.embedding;

        if embedding.is_empty() {
            return Err(AppError::Provider("Empty embedding response".to_string()));
        }

        Ok(embedding)
    }

    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            0.0
        } else {
            dot_product / (norm_a * norm_b)
        }
    }

    /// 1 minus cosine similarity. Smaller means more similar.
    pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
        1.0 - Self::cosine_similarity(a, b)
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.generate_embedding(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0];
        let similarity = EmbeddingService::cosine_similarity(&a, &b);
        assert!((similarity - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0];
        let similarity = EmbeddingService::cosine_similarity(&a, &c);
        assert!((similarity - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_distance_orders_by_similarity() {
        let query = vec![1.0, 0.0];
        let close = vec![0.9, 0.1];
        let far = vec![0.1, 0.9];
        assert!(
            EmbeddingService::cosine_distance(&query, &close)
                < EmbeddingService::cosine_distance(&query, &far)
        );
    }

    #[test]
    fn test_zero_vector_is_maximally_distant() {
        let a = vec![1.0, 0.0];
        let zero = vec![0.0, 0.0];
        assert_eq!(EmbeddingService::cosine_distance(&a, &zero), 1.0);
    }

    #[test]
    fn test_mismatched_lengths_score_zero() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0];
        assert_eq!(EmbeddingService::cosine_similarity(&a, &b), 0.0);
    }
}
