//! CSV export of one request's result rows.

use crate::domain::entities::ResultSet;
use crate::domain::error::{AppError, Result};
use chrono::Local;
use std::path::PathBuf;
use tracing::info;

pub struct CsvExporter {
    export_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    /// Write the result set to a timestamped CSV file and return its path.
    pub fn write(&self, result: &ResultSet) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.export_dir)?;

        let filename = format!(
            "query_export_{}.csv",
            Local::now().format("%Y%m%d_%H%M%S%3f")
        );
        let path = self.export_dir.join(filename);

        let mut writer = csv::Writer::from_path(&path)
            .map_err(|e| AppError::IoError(format!("Failed to create export file: {}", e)))?;

        writer
            .write_record(&result.columns)
            .map_err(|e| AppError::IoError(format!("Failed to write export header: {}", e)))?;
        for row in &result.rows {
            let rendered: Vec<String> = row.iter().map(render_value).collect();
            writer
                .write_record(&rendered)
                .map_err(|e| AppError::IoError(format!("Failed to write export row: {}", e)))?;
        }
        writer
            .flush()
            .map_err(|e| AppError::IoError(format!("Failed to flush export file: {}", e)))?;

        info!(path = %path.display(), rows = result.rows.len(), "Result set exported");
        Ok(path)
    }
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
