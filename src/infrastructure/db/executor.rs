//! Execution collaborator contract.
//!
//! The pipeline produces cleaned SQL text; running it belongs to whatever
//! database adapter the deployment wires in. An execution failure is data,
//! not an `AppError`: the message travels back to the caller verbatim next
//! to the SQL that caused it.

use crate::domain::entities::ResultSet;
use async_trait::async_trait;

#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run the statement. `Err` carries the database's own error message,
    /// passed through untranslated. Implementations pre-materialize large
    /// objects and call `strip_rowid_columns` before returning rows.
    async fn execute(&self, sql: &str) -> std::result::Result<ResultSet, String>;
}

/// Placeholder executor for deployments that only generate SQL.
pub struct UnconfiguredExecutor;

#[async_trait]
impl SqlExecutor for UnconfiguredExecutor {
    async fn execute(&self, _sql: &str) -> std::result::Result<ResultSet, String> {
        Err("No database executor configured".to_string())
    }
}

/// Drop every column whose name contains `ROWID`, keeping the order of the
/// remaining columns.
pub fn strip_rowid_columns(result: ResultSet) -> ResultSet {
    let kept: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.contains("ROWID"))
        .map(|(idx, _)| idx)
        .collect();

    if kept.len() == result.columns.len() {
        return result;
    }

    ResultSet {
        columns: kept.iter().map(|&i| result.columns[i].clone()).collect(),
        rows: result
            .rows
            .into_iter()
            .map(|row| kept.iter().filter_map(|&i| row.get(i).cloned()).collect())
            .collect(),
    }
}
