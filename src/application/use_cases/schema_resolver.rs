//! Embedding-based resolution of LLM-named tables and columns against the
//! real schema.
//!
//! The extraction model names tables and columns in free text, which rarely
//! matches the actual identifiers (synonyms, casing, spacing). Each candidate
//! is normalized, embedded, and snapped to its nearest schema entry by cosine
//! distance. That nearest-neighbor bridge is what grounds generation in
//! identifiers that really exist.

use crate::application::use_cases::embedding_service::{EmbeddingProvider, EmbeddingService};
use crate::application::use_cases::schema_index::SchemaIndex;
use crate::application::use_cases::text_cleaner::normalize_key;
use crate::domain::entities::{CandidateExtraction, ResolvedColumn, SchemaColumn, TableEmbedding};
use crate::domain::error::Result;
use std::fmt::Write;
use std::sync::Arc;
use tracing::debug;

pub struct SchemaResolver {
    schema: Arc<SchemaIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SchemaResolver {
    pub fn new(schema: Arc<SchemaIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { schema, embedder }
    }

    /// Resolve an extraction into grounded (column, datatype, table) entries.
    ///
    /// Zero resolved tables is not an error: the column search falls back to
    /// the whole schema and generation runs against an unconstrained
    /// description.
    pub async fn resolve(&self, extraction: &CandidateExtraction) -> Result<Vec<ResolvedColumn>> {
        let tables = self
            .find_tables(&extraction.table_names, extraction.table_count)
            .await?;

        let pool = if tables.is_empty() {
            debug!("No tables resolved, falling back to the full column set");
            self.schema.columns().to_vec()
        } else {
            self.schema.columns_for_tables(&tables)
        };

        self.find_columns(&extraction.column_names, extraction.column_count, &pool)
            .await
    }

    /// Nearest real table per candidate name, deduplicated in first-match
    /// order. `count_hint` is the extraction model's self-reported table
    /// count; when it is at least one it bounds how many distinct tables are
    /// accepted, and zero means unbounded. A hint that disagrees with the
    /// candidate list is tolerated.
    pub async fn find_tables(&self, candidates: &[String], count_hint: usize) -> Result<Vec<String>> {
        let limit = if count_hint >= 1 {
            count_hint
        } else {
            usize::MAX
        };

        let mut resolved: Vec<String> = Vec::new();
        for candidate in candidates {
            if resolved.len() >= limit {
                break;
            }
            let key = normalize_key(candidate);
            if key.is_empty() {
                continue;
            }
            let embedding = self.embedder.embed(&key).await?;
            if let Some(table) = nearest_table(self.schema.tables(), &embedding) {
                if !resolved.contains(&table.table_name) {
                    resolved.push(table.table_name.clone());
                }
            }
        }

        debug!(candidates = candidates.len(), resolved = resolved.len(), "Resolved tables");
        Ok(resolved)
    }

    /// Nearest real column per candidate name, restricted to `pool` (the
    /// columns of the already-resolved tables), deduplicated on the
    /// (table, column) pair. Same advisory `count_hint` semantics as
    /// `find_tables`.
    pub async fn find_columns(
        &self,
        candidates: &[String],
        count_hint: usize,
        pool: &[SchemaColumn],
    ) -> Result<Vec<ResolvedColumn>> {
        let limit = if count_hint >= 1 {
            count_hint
        } else {
            usize::MAX
        };

        let mut resolved: Vec<ResolvedColumn> = Vec::new();
        for candidate in candidates {
            if resolved.len() >= limit {
                break;
            }
            let key = normalize_key(candidate);
            if key.is_empty() {
                continue;
            }
            let embedding = self.embedder.embed(&key).await?;
            if let Some(column) = nearest_column(pool, &embedding) {
                let already = resolved.iter().any(|r| {
                    r.column_name == column.column_name && r.table_name == column.table_name
                });
                if !already {
                    resolved.push(ResolvedColumn {
                        column_name: column.column_name.clone(),
                        datatype: column.datatype.clone(),
                        table_name: column.table_name.clone(),
                    });
                }
            }
        }

        debug!(candidates = candidates.len(), resolved = resolved.len(), "Resolved columns");
        Ok(resolved)
    }

    /// Render the grounding as the schema description block fed verbatim to
    /// the generation prompt, one `("column", datatype, table)` line each.
    pub fn render_schema(resolved: &[ResolvedColumn]) -> String {
        let mut description = String::new();
        for column in resolved {
            writeln!(
                description,
                "(\"{}\", {}, {})",
                column.column_name, column.datatype, column.table_name
            )
            .unwrap();
        }
        description
    }
}

fn nearest_table<'a>(tables: &'a [TableEmbedding], embedding: &[f32]) -> Option<&'a TableEmbedding> {
    let mut best: Option<(&TableEmbedding, f32)> = None;
    for table in tables {
        let distance = EmbeddingService::cosine_distance(embedding, &table.embedding);
        let better = match &best {
            None => true,
            Some((current, best_distance)) => {
                distance < *best_distance
                    || (distance == *best_distance && table.table_name < current.table_name)
            }
        };
        if better {
            best = Some((table, distance));
        }
    }
    best.map(|(table, _)| table)
}

fn nearest_column<'a>(pool: &'a [SchemaColumn], embedding: &[f32]) -> Option<&'a SchemaColumn> {
    let mut best: Option<(&SchemaColumn, f32)> = None;
    for column in pool {
        let distance = EmbeddingService::cosine_distance(embedding, &column.embedding);
        let better = match &best {
            None => true,
            Some((current, best_distance)) => {
                distance < *best_distance
                    || (distance == *best_distance
                        && (column.column_name.as_str(), column.table_name.as_str())
                            < (current.column_name.as_str(), current.table_name.as_str()))
            }
        };
        if better {
            best = Some((column, distance));
        }
    }
    best.map(|(column, _)| column)
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn schema_column(table: &str, column: &str, embedding: Vec<f32>) -> SchemaColumn {
        SchemaColumn {
            table_name: table.to_string(),
            column_name: column.to_string(),
            datatype: "VARCHAR2".to_string(),
            embedding,
        }
    }

    async fn resolver(
        columns: Vec<SchemaColumn>,
        table_vectors: Vec<(&str, Vec<f32>)>,
        candidate_vectors: Vec<(&str, Vec<f32>)>,
    ) -> SchemaResolver {
        let mut vectors: HashMap<String, Vec<f32>> = HashMap::new();
        for (key, v) in table_vectors {
            vectors.insert(key.to_string(), v);
        }
        for (key, v) in candidate_vectors {
            vectors.insert(key.to_string(), v);
        }
        let embedder = Arc::new(StaticEmbedder { vectors });
        let schema = Arc::new(SchemaIndex::build(columns, embedder.as_ref()).await.unwrap());
        SchemaResolver::new(schema, embedder)
    }

    #[tokio::test]
    async fn test_find_tables_deduplicates_candidates_hitting_same_table() {
        let resolver = resolver(
            vec![
                schema_column("V_ARC_PRODUCT_INQUIRY_SV", "Date Opened", vec![1.0, 0.0]),
                schema_column("V_ARC_EMIR_SV", "CIC", vec![0.0, 1.0]),
            ],
            vec![
                ("v_arc_product_inquiry_sv", vec![1.0, 0.0]),
                ("v_arc_emir_sv", vec![0.0, 1.0]),
            ],
            vec![
                ("productinquiries", vec![0.95, 0.05]),
                ("inquiries", vec![0.9, 0.1]),
            ],
        )
        .await;

        let tables = resolver
            .find_tables(
                &["Product Inquiries".to_string(), "Inquiries".to_string()],
                0,
            )
            .await
            .unwrap();
        assert_eq!(tables, vec!["V_ARC_PRODUCT_INQUIRY_SV"]);
    }

    #[tokio::test]
    async fn test_count_hint_bounds_accepted_tables() {
        let resolver = resolver(
            vec![
                schema_column("A", "x", vec![1.0, 0.0]),
                schema_column("B", "y", vec![0.0, 1.0]),
            ],
            vec![("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0])],
            vec![("alpha", vec![1.0, 0.0]), ("beta", vec![0.0, 1.0])],
        )
        .await;

        let bounded = resolver
            .find_tables(&["alpha".to_string(), "beta".to_string()], 1)
            .await
            .unwrap();
        assert_eq!(bounded, vec!["A"]);

        let unbounded = resolver
            .find_tables(&["alpha".to_string(), "beta".to_string()], 0)
            .await
            .unwrap();
        assert_eq!(unbounded.len(), 2);
    }

    #[tokio::test]
    async fn test_equal_distance_prefers_lexicographically_smallest_table() {
        let resolver = resolver(
            vec![
                schema_column("ZEBRA", "x", vec![1.0, 0.0]),
                schema_column("APPLE", "y", vec![1.0, 0.0]),
            ],
            vec![("zebra", vec![1.0, 0.0]), ("apple", vec![1.0, 0.0])],
            vec![("anything", vec![1.0, 0.0])],
        )
        .await;

        let tables = resolver
            .find_tables(&["anything".to_string()], 0)
            .await
            .unwrap();
        assert_eq!(tables, vec!["APPLE"]);
    }

    #[tokio::test]
    async fn test_resolved_columns_always_belong_to_their_table() {
        let columns = vec![
            schema_column("A", "shared_name", vec![1.0, 0.0]),
            schema_column("B", "shared_name", vec![0.99, 0.01]),
            schema_column("A", "other", vec![0.0, 1.0]),
        ];
        let resolver = resolver(
            columns.clone(),
            vec![("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0])],
            vec![("sharedname", vec![1.0, 0.0]), ("tablea", vec![1.0, 0.0])],
        )
        .await;

        let extraction = CandidateExtraction {
            table_names: vec!["table a".to_string()],
            table_count: 1,
            column_names: vec!["Shared Name".to_string()],
            column_count: 1,
        };
        let resolved = resolver.resolve(&extraction).await.unwrap();

        assert_eq!(resolved.len(), 1);
        for entry in &resolved {
            assert!(columns.iter().any(|c| {
                c.table_name == entry.table_name && c.column_name == entry.column_name
            }));
            // The pool was restricted to table A, so B's identical column
            // name cannot leak in.
            assert_eq!(entry.table_name, "A");
        }
    }

    #[tokio::test]
    async fn test_zero_resolved_tables_degrades_to_full_schema_pool() {
        let resolver = resolver(
            vec![
                schema_column("A", "x", vec![1.0, 0.0]),
                schema_column("B", "y", vec![0.0, 1.0]),
            ],
            vec![("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0])],
            vec![("y", vec![0.0, 1.0])],
        )
        .await;

        let extraction = CandidateExtraction {
            table_names: Vec::new(),
            table_count: 0,
            column_names: vec!["y".to_string()],
            column_count: 1,
        };
        let resolved = resolver.resolve(&extraction).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].table_name, "B");
    }

    #[test]
    fn test_render_schema_formats_one_line_per_entry() {
        let resolved = vec![
            ResolvedColumn {
                column_name: "Date Opened".to_string(),
                datatype: "DATE".to_string(),
                table_name: "V_ARC_PRODUCT_INQUIRY_SV".to_string(),
            },
            ResolvedColumn {
                column_name: "CIC".to_string(),
                datatype: "VARCHAR2".to_string(),
                table_name: "V_ARC_EMIR_SV".to_string(),
            },
        ];

        let description = SchemaResolver::render_schema(&resolved);
        assert_eq!(
            description,
            "(\"Date Opened\", DATE, V_ARC_PRODUCT_INQUIRY_SV)\n(\"CIC\", VARCHAR2, V_ARC_EMIR_SV)\n"
        );
    }
}
