//! Process configuration: `nlsql.toml` overlaid with `NLSQL_`-prefixed
//! environment variables (double underscore separates sections, e.g.
//! `NLSQL_CHAT__API_KEY`). A `.env` file is honored when present.

use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    /// Chat model used for both pipeline calls.
    #[serde(default)]
    pub chat: LLMConfig,
    /// Embedding model used for queries, candidates, and table names.
    #[serde(default = "default_embedding_config")]
    pub embedding: LLMConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalSettings {
    /// How many verified queries feed the extraction prompt.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Owner prefix required on every generated table reference.
    #[serde(default = "default_schema_owner")]
    pub schema_owner: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    #[serde(default = "default_verified_log_path")]
    pub verified_log_path: PathBuf,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_top_n() -> usize {
    3
}

fn default_schema_owner() -> String {
    "SYSADM".to_string()
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("data/schema_snapshot.csv")
}

fn default_verified_log_path() -> PathBuf {
    PathBuf::from("data/query_verification.jsonl")
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_embedding_config() -> LLMConfig {
    LLMConfig {
        provider: LLMProvider::Local,
        base_url: String::new(),
        model: "all-minilm-l6-v2".to_string(),
        api_key: None,
        max_tokens: None,
        temperature: None,
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            schema_owner: default_schema_owner(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            verified_log_path: default_verified_log_path(),
            export_dir: default_export_dir(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("nlsql.toml"))
                .merge(Env::prefixed("NLSQL_").split("__")),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| AppError::Config(format!("Failed to load settings: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_without_any_source() {
        let settings = Settings::from_figment(Figment::new()).unwrap();
        assert_eq!(settings.server.port, 3001);
        assert_eq!(settings.retrieval.top_n, 3);
        assert_eq!(settings.retrieval.schema_owner, "SYSADM");
        assert_eq!(settings.embedding.model, "all-minilm-l6-v2");
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = Figment::new().merge(Toml::string(
            r#"
            [server]
            port = 4100

            [retrieval]
            top_n = 5
            schema_owner = "APPOWNER"
            "#,
        ));
        let settings = Settings::from_figment(figment).unwrap();
        assert_eq!(settings.server.port, 4100);
        assert_eq!(settings.retrieval.top_n, 5);
        assert_eq!(settings.retrieval.schema_owner, "APPOWNER");
        // Untouched sections keep their defaults.
        assert_eq!(
            settings.storage.snapshot_path,
            PathBuf::from("data/schema_snapshot.csv")
        );
    }
}
