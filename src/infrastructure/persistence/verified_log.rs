//! Append-only JSONL log backing the verified-query index.
//!
//! One record per line. The recorder checks for duplicates before appending,
//! so the log itself makes no uniqueness guarantee; the loader collapses
//! exact (user_query, sql_query) repeats left behind by a crash mid-append.

use crate::domain::entities::VerifiedQuery;
use crate::domain::error::{AppError, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

pub struct JsonlVerifiedLog {
    path: PathBuf,
}

impl JsonlVerifiedLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, record: &VerifiedQuery) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(record)
            .map_err(|e| AppError::Internal(format!("Failed to serialize record: {}", e)))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Load every record, skipping unreadable lines and collapsing exact
    /// duplicates (first occurrence wins). A missing file is an empty index.
    pub fn load(&self) -> Result<Vec<VerifiedQuery>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No verified-query log yet, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut records: Vec<VerifiedQuery> = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<VerifiedQuery>(line) {
                Ok(record) => {
                    let duplicate = records.iter().any(|r| {
                        r.user_query == record.user_query && r.sql_query == record.sql_query
                    });
                    if !duplicate {
                        records.push(record);
                    }
                }
                Err(e) => {
                    warn!(line = line_no + 1, error = %e, "Skipping unreadable log line");
                }
            }
        }

        info!(
            path = %self.path.display(),
            records = records.len(),
            "Verified-query log loaded"
        );
        Ok(records)
    }
}
