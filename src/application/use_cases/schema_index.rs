//! In-memory schema embedding index.
//!
//! Built once at startup from the snapshot and read-only for the process
//! lifetime. A rebuild means regenerating the snapshot and restarting; there
//! is no hot path that mutates this index.

use crate::application::use_cases::embedding_service::EmbeddingProvider;
use crate::application::use_cases::text_cleaner::normalize_key;
use crate::domain::entities::{SchemaColumn, TableEmbedding};
use crate::domain::error::Result;
use tracing::info;

pub struct SchemaIndex {
    columns: Vec<SchemaColumn>,
    tables: Vec<TableEmbedding>,
}

impl SchemaIndex {
    /// Build the index from snapshot rows. Column embeddings come precomputed
    /// with the snapshot; table embeddings are derived here by embedding each
    /// distinct normalized table name.
    pub async fn build(
        columns: Vec<SchemaColumn>,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Self> {
        let mut table_names: Vec<String> = Vec::new();
        for column in &columns {
            if !table_names.contains(&column.table_name) {
                table_names.push(column.table_name.clone());
            }
        }

        let mut tables = Vec::with_capacity(table_names.len());
        for table_name in table_names {
            let embedding = embedder.embed(&normalize_key(&table_name)).await?;
            tables.push(TableEmbedding {
                table_name,
                embedding,
            });
        }

        info!(
            tables = tables.len(),
            columns = columns.len(),
            "Schema index built"
        );

        Ok(Self { columns, tables })
    }

    pub fn tables(&self) -> &[TableEmbedding] {
        &self.tables
    }

    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    /// Columns belonging to the given tables, snapshot order preserved.
    pub fn columns_for_tables(&self, table_names: &[String]) -> Vec<SchemaColumn> {
        self.columns
            .iter()
            .filter(|c| table_names.contains(&c.table_name))
            .cloned()
            .collect()
    }
}
