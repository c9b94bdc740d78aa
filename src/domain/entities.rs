use serde::{Deserialize, Serialize};

/// One real (table, column) pair from the schema snapshot, with the
/// precomputed embedding of the cleaned column name. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub table_name: String,
    pub column_name: String,
    pub datatype: String,
    pub embedding: Vec<f32>,
}

/// One distinct table, embedded from its normalized name at startup.
#[derive(Debug, Clone)]
pub struct TableEmbedding {
    pub table_name: String,
    pub embedding: Vec<f32>,
}

/// A manually confirmed (question, SQL) pair stored for retrieval.
///
/// Append-only. No two records share the same raw (user_query, sql_query)
/// pair; the check is on raw text, not embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedQuery {
    pub user_query: String,
    pub sql_query: String,
    pub user_query_embedding: Vec<f32>,
    pub sql_query_embedding: Vec<f32>,
}

/// Table/column candidates parsed from the extraction LLM's free text.
///
/// The counts come from the LLM's self-report and may disagree with the
/// parsed list lengths. They are advisory only.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateExtraction {
    pub table_names: Vec<String>,
    pub table_count: usize,
    pub column_names: Vec<String>,
    pub column_count: usize,
}

/// One grounded schema entry fed into SQL generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedColumn {
    pub column_name: String,
    pub datatype: String,
    pub table_name: String,
}

/// Rows returned by the execution collaborator, column order preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }
}
