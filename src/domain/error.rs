use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    Config(String),
    ParseError(String),
    /// Embedding or chat call failed: network, auth, rate limit.
    Provider(String),
    /// SQL fence markers absent or degenerate in the LLM response.
    ExtractionFormat(String),
    IoError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::Config(msg) => write!(f, "Config error: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::Provider(msg) => write!(f, "Provider error: {}", msg),
            AppError::ExtractionFormat(msg) => write!(f, "Extraction format error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
