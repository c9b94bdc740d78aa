use crate::application::use_cases::query_pipeline::QueryPipeline;
use crate::application::use_cases::verified_queries::VerificationRecorder;
use crate::domain::entities::ResultSet;
use crate::infrastructure::db::SqlExecutor;
use crate::infrastructure::persistence::export::CsvExporter;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct AppState {
    pub pipeline: QueryPipeline,
    pub recorder: VerificationRecorder,
    pub executor: Arc<dyn SqlExecutor>,
    pub exporter: CsvExporter,
    pub exports: Mutex<ExportStore>,
}

/// Short-lived, bounded store of per-request result sets awaiting export.
///
/// Each `/query` response carries a token; redeeming it at `/export_data`
/// removes the entry. Results never live in process-wide "last query" state,
/// so concurrent callers cannot see each other's rows.
pub struct ExportStore {
    entries: VecDeque<(Uuid, ResultSet)>,
    capacity: usize,
}

impl ExportStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Park a result set and hand back its token, evicting the oldest entry
    /// once the store is full.
    pub fn insert(&mut self, result: ResultSet) -> Uuid {
        let token = Uuid::new_v4();
        self.entries.push_back((token, result));
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        token
    }

    /// Redeem a token. Single use: the entry is removed.
    pub fn take(&mut self, token: &Uuid) -> Option<ResultSet> {
        let position = self.entries.iter().position(|(id, _)| id == token)?;
        self.entries.remove(position).map(|(_, result)| result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_with_marker(marker: i64) -> ResultSet {
        ResultSet {
            columns: vec!["ID".to_string()],
            rows: vec![vec![json!(marker)]],
        }
    }

    #[test]
    fn test_tokens_are_single_use() {
        let mut store = ExportStore::new(4);
        let token = store.insert(result_with_marker(1));

        assert!(store.take(&token).is_some());
        assert!(store.take(&token).is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest_first() {
        let mut store = ExportStore::new(2);
        let first = store.insert(result_with_marker(1));
        let second = store.insert(result_with_marker(2));
        let third = store.insert(result_with_marker(3));

        assert!(store.take(&first).is_none());
        assert!(store.take(&second).is_some());
        assert!(store.take(&third).is_some());
    }

    #[test]
    fn test_concurrent_requests_do_not_share_results() {
        let mut store = ExportStore::new(4);
        let token_a = store.insert(result_with_marker(1));
        let token_b = store.insert(result_with_marker(2));

        let result_b = store.take(&token_b).unwrap();
        let result_a = store.take(&token_a).unwrap();
        assert_eq!(result_a.rows[0][0], json!(1));
        assert_eq!(result_b.rows[0][0], json!(2));
    }
}
