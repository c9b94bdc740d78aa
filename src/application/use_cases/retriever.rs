//! Nearest-neighbor retrieval of verified queries.
//!
//! The retrieved pairs are rendered into a textual context block and passed
//! verbatim into the table-extraction prompt as in-context examples.

use crate::application::use_cases::embedding_service::{EmbeddingProvider, EmbeddingService};
use crate::application::use_cases::text_cleaner::normalize_key;
use crate::application::use_cases::verified_queries::VerifiedQueryIndex;
use crate::domain::error::Result;
use std::cmp::Ordering;
use std::fmt::Write;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RetrievedExample {
    pub user_query: String,
    pub sql_query: String,
    pub distance: f32,
}

pub struct QueryRetriever {
    index: Arc<VerifiedQueryIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl QueryRetriever {
    pub fn new(index: Arc<VerifiedQueryIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, embedder }
    }

    /// The `top_n` stored queries closest to `user_query` by cosine distance,
    /// ascending. Ties keep insertion order (stable sort). `top_n` larger
    /// than the index returns everything; an empty index returns nothing and
    /// never fails.
    pub async fn retrieve(&self, user_query: &str, top_n: usize) -> Result<Vec<RetrievedExample>> {
        if self.index.is_empty() || top_n == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(&normalize_key(user_query)).await?;

        let records = self.index.read();
        let mut scored: Vec<RetrievedExample> = records
            .iter()
            .map(|r| RetrievedExample {
                user_query: r.user_query.clone(),
                sql_query: r.sql_query.clone(),
                distance: EmbeddingService::cosine_distance(
                    &query_embedding,
                    &r.user_query_embedding,
                ),
            })
            .collect();

        scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        scored.truncate(top_n);

        debug!(
            candidates = records.len(),
            returned = scored.len(),
            "Retrieved closest verified queries"
        );

        Ok(scored)
    }

    /// Render retrieved pairs as the context block used in the extraction
    /// prompt. An empty slice renders as an empty string.
    pub fn render_context(examples: &[RetrievedExample]) -> String {
        if examples.is_empty() {
            return String::new();
        }

        let mut context =
            String::from("Here are some closely related queries to provide context:\n");
        for example in examples {
            writeln!(context, "User Query: {}", example.user_query).unwrap();
            writeln!(context, "SQL Query: {}\n", example.sql_query).unwrap();
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::VerifiedQuery;
    use crate::domain::error::AppError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StaticEmbedder {
        vectors: HashMap<String, Vec<f32>>,
    }

    #[async_trait]
    impl EmbeddingProvider for StaticEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.vectors
                .get(text)
                .cloned()
                .ok_or_else(|| AppError::Provider(format!("no vector for '{}'", text)))
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(AppError::Provider("provider down".to_string()))
        }
    }

    fn record(user_query: &str, sql: &str, embedding: Vec<f32>) -> VerifiedQuery {
        VerifiedQuery {
            user_query: user_query.to_string(),
            sql_query: sql.to_string(),
            user_query_embedding: embedding,
            sql_query_embedding: vec![0.0, 0.0],
        }
    }

    fn retriever_over(records: Vec<VerifiedQuery>) -> QueryRetriever {
        let embedder = StaticEmbedder {
            vectors: HashMap::from([("showopeninquiries".to_string(), vec![1.0, 0.0])]),
        };
        QueryRetriever::new(
            Arc::new(VerifiedQueryIndex::new(records)),
            Arc::new(embedder),
        )
    }

    #[tokio::test]
    async fn test_returns_exactly_top_n_sorted_by_distance() {
        let retriever = retriever_over(vec![
            record("far", "SELECT 1", vec![0.0, 1.0]),
            record("close", "SELECT 2", vec![0.9, 0.1]),
            record("closest", "SELECT 3", vec![1.0, 0.0]),
        ]);

        let results = retriever.retrieve("show open inquiries!", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].user_query, "closest");
        assert_eq!(results[1].user_query, "close");
        assert!(results[0].distance <= results[1].distance);
    }

    #[tokio::test]
    async fn test_top_n_beyond_index_size_returns_all() {
        let retriever = retriever_over(vec![
            record("a", "SELECT 1", vec![1.0, 0.0]),
            record("b", "SELECT 2", vec![0.0, 1.0]),
        ]);

        let results = retriever.retrieve("show open inquiries", 10).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let retriever = retriever_over(vec![
            record("first", "SELECT 1", vec![1.0, 0.0]),
            record("second", "SELECT 2", vec![1.0, 0.0]),
        ]);

        let results = retriever.retrieve("show open inquiries", 2).await.unwrap();
        assert_eq!(results[0].user_query, "first");
        assert_eq!(results[1].user_query, "second");
    }

    #[tokio::test]
    async fn test_empty_index_never_fails_even_with_broken_provider() {
        let retriever = QueryRetriever::new(
            Arc::new(VerifiedQueryIndex::new(Vec::new())),
            Arc::new(FailingEmbedder),
        );

        let results = retriever.retrieve("anything", 3).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(QueryRetriever::render_context(&results), "");
    }

    #[tokio::test]
    async fn test_render_context_lists_pairs_in_order() {
        let examples = vec![
            RetrievedExample {
                user_query: "q1".to_string(),
                sql_query: "SELECT 1".to_string(),
                distance: 0.1,
            },
            RetrievedExample {
                user_query: "q2".to_string(),
                sql_query: "SELECT 2".to_string(),
                distance: 0.2,
            },
        ];

        let context = QueryRetriever::render_context(&examples);
        assert!(context.starts_with("Here are some closely related queries"));
        let q1 = context.find("User Query: q1").unwrap();
        let q2 = context.find("User Query: q2").unwrap();
        assert!(q1 < q2);
        assert!(context.contains("SQL Query: SELECT 1"));
    }
}
