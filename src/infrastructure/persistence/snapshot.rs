//! Schema snapshot loader.
//!
//! The snapshot is a CSV produced out-of-band, one row per (table, column)
//! with the precomputed embedding of the cleaned column name stored as a JSON
//! array. Regenerating it and restarting is the only way the schema index
//! changes.

use crate::domain::entities::SchemaColumn;
use crate::domain::error::{AppError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

const REQUIRED_HEADERS: [&str; 4] = ["table_name", "column_name", "datatype", "embedding_json"];

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    table_name: String,
    column_name: String,
    datatype: String,
    embedding_json: String,
}

pub fn load_schema_snapshot(path: &Path) -> Result<Vec<SchemaColumn>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        AppError::Config(format!(
            "Failed to open schema snapshot {}: {}",
            path.display(),
            e
        ))
    })?;

    let headers = reader
        .headers()
        .map_err(|e| AppError::Config(format!("Failed to read snapshot headers: {}", e)))?
        .clone();
    for required in REQUIRED_HEADERS {
        if !headers.iter().any(|h| h == required) {
            return Err(AppError::Config(format!(
                "Schema snapshot is missing required column '{}'",
                required
            )));
        }
    }

    let mut columns = Vec::new();
    for (row_no, row) in reader.deserialize::<SnapshotRow>().enumerate() {
        let row = row.map_err(|e| {
            AppError::Config(format!("Bad snapshot row {}: {}", row_no + 2, e))
        })?;
        let embedding: Vec<f32> = serde_json::from_str(&row.embedding_json).map_err(|e| {
            AppError::Config(format!(
                "Bad embedding JSON in snapshot row {} ({}.{}): {}",
                row_no + 2,
                row.table_name,
                row.column_name,
                e
            ))
        })?;
        if embedding.is_empty() {
            return Err(AppError::Config(format!(
                "Empty embedding in snapshot row {} ({}.{})",
                row_no + 2,
                row.table_name,
                row.column_name
            )));
        }
        columns.push(SchemaColumn {
            table_name: row.table_name,
            column_name: row.column_name,
            datatype: row.datatype,
            embedding,
        });
    }

    info!(
        path = %path.display(),
        columns = columns.len(),
        "Schema snapshot loaded"
    );
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_snapshot(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_loads_rows_with_embeddings() {
        let (_dir, path) = write_snapshot(
            "table_name,column_name,datatype,embedding_json\n\
             V_ARC_PRODUCT_INQUIRY_SV,Date Opened,DATE,\"[0.1, 0.2]\"\n\
             V_ARC_EMIR_SV,CIC,VARCHAR2,\"[0.3, 0.4]\"\n",
        );

        let columns = load_schema_snapshot(&path).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].table_name, "V_ARC_PRODUCT_INQUIRY_SV");
        assert_eq!(columns[0].column_name, "Date Opened");
        assert_eq!(columns[0].embedding, vec![0.1, 0.2]);
    }

    #[test]
    fn test_missing_required_header_fails_fast() {
        let (_dir, path) = write_snapshot(
            "table_name,column_name,embedding_json\nA,x,\"[0.1]\"\n",
        );
        let err = load_schema_snapshot(&path).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("datatype"));
    }

    #[test]
    fn test_malformed_embedding_fails_fast() {
        let (_dir, path) = write_snapshot(
            "table_name,column_name,datatype,embedding_json\nA,x,DATE,not-json\n",
        );
        let err = load_schema_snapshot(&path).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
