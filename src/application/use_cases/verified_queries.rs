//! Verified-query index and the verification recorder.
//!
//! The index is the in-memory view of the append-only JSONL log. It loads
//! once at startup and every successful `verify` call appends to the log and
//! then to the index, so retrieval sees new records immediately within the
//! process. Restart-time duplicates (crash between log write and anything
//! else) are collapsed by the loader's exact-text dedupe, not by any
//! transactional guarantee.

use crate::application::use_cases::embedding_service::EmbeddingProvider;
use crate::application::use_cases::text_cleaner::normalize_key;
use crate::domain::entities::VerifiedQuery;
use crate::domain::error::Result;
use crate::infrastructure::persistence::verified_log::JsonlVerifiedLog;
use std::sync::{Arc, RwLock, RwLockReadGuard};
use tracing::info;

/// Outcome of a verification submit. Duplicate is a normal reported result,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerifyOutcome {
    Stored,
    Duplicate,
}

pub struct VerifiedQueryIndex {
    records: RwLock<Vec<VerifiedQuery>>,
}

impl VerifiedQueryIndex {
    pub fn new(records: Vec<VerifiedQuery>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<VerifiedQuery>> {
        self.records.read().unwrap()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exact raw-text duplicate check on the (user_query, sql_query) pair.
    pub fn contains(&self, user_query: &str, sql_query: &str) -> bool {
        self.records
            .read()
            .unwrap()
            .iter()
            .any(|r| r.user_query == user_query && r.sql_query == sql_query)
    }

    fn append(&self, record: VerifiedQuery) {
        self.records.write().unwrap().push(record);
    }
}

pub struct VerificationRecorder {
    index: Arc<VerifiedQueryIndex>,
    log: Arc<JsonlVerifiedLog>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl VerificationRecorder {
    pub fn new(
        index: Arc<VerifiedQueryIndex>,
        log: Arc<JsonlVerifiedLog>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            index,
            log,
            embedder,
        }
    }

    /// Store a confirmed (question, SQL) pair, unless the exact pair already
    /// exists. The user query is normalized before embedding; the SQL text is
    /// embedded as written.
    pub async fn verify(&self, user_query: &str, sql_query: &str) -> Result<VerifyOutcome> {
        if self.index.contains(user_query, sql_query) {
            info!("Duplicate verified query, nothing stored");
            return Ok(VerifyOutcome::Duplicate);
        }

        let user_query_embedding = self.embedder.embed(&normalize_key(user_query)).await?;
        let sql_query_embedding = self.embedder.embed(sql_query).await?;

        let record = VerifiedQuery {
            user_query: user_query.to_string(),
            sql_query: sql_query.to_string(),
            user_query_embedding,
            sql_query_embedding,
        };

        // Log first; the index append is only reachable once the record is
        // durable.
        self.log.append(&record)?;
        self.index.append(record);

        info!(total = self.index.len(), "Verified query stored");
        Ok(VerifyOutcome::Stored)
    }
}
