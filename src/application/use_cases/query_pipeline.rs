//! Orchestration of one natural-language-to-SQL request.
//!
//! Per request the pipeline moves through four stages, terminal on the first
//! failure: retrieve examples and extract table/column candidates, resolve
//! them against the schema index, generate SQL with the grounded schema, and
//! extract the fenced statement. Zero resolved tables does not stop the run;
//! generation then works against the unconstrained schema description.

use crate::application::use_cases::candidate_parser::parse_candidates;
use crate::application::use_cases::prompt_builder::PromptBuilder;
use crate::application::use_cases::retriever::QueryRetriever;
use crate::application::use_cases::schema_resolver::SchemaResolver;
use crate::application::use_cases::sql_extractor::extract_sql;
use crate::domain::entities::ResolvedColumn;
use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::llm_clients::LLMClient;
use crate::shared::query_hash::hash_query;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Terminal state of a successful run: the cleaned SQL plus the grounding it
/// was generated against.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSql {
    pub sql: String,
    pub resolved_schema: Vec<ResolvedColumn>,
}

pub struct QueryPipeline {
    retriever: QueryRetriever,
    resolver: SchemaResolver,
    prompts: PromptBuilder,
    llm: Arc<dyn LLMClient>,
    llm_config: LLMConfig,
    top_n: usize,
}

impl QueryPipeline {
    pub fn new(
        retriever: QueryRetriever,
        resolver: SchemaResolver,
        prompts: PromptBuilder,
        llm: Arc<dyn LLMClient>,
        llm_config: LLMConfig,
        top_n: usize,
    ) -> Self {
        Self {
            retriever,
            resolver,
            prompts,
            llm,
            llm_config,
            top_n,
        }
    }

    pub async fn run(&self, user_query: &str) -> Result<GeneratedSql> {
        let query_hash = hash_query(user_query);
        info!(query_hash = %query_hash, "Query pipeline start");

        // Stage 1: extraction. Retrieval context goes into the system prompt
        // as in-context examples.
        let examples = self.retriever.retrieve(user_query, self.top_n).await?;
        let context = QueryRetriever::render_context(&examples);
        let extraction_response = self
            .llm
            .generate(
                &self.llm_config,
                &self.prompts.extraction_prompt(&context),
                user_query,
            )
            .await?;
        let extraction = parse_candidates(&extraction_response)?;
        info!(
            query_hash = %query_hash,
            examples = examples.len(),
            tables = extraction.table_names.len(),
            columns = extraction.column_names.len(),
            "Candidates extracted"
        );

        // Stage 2: resolution against the schema index.
        let resolved = self.resolver.resolve(&extraction).await?;
        if resolved.is_empty() {
            warn!(query_hash = %query_hash, "Nothing resolved, generating unconstrained");
        }
        let schema_description = SchemaResolver::render_schema(&resolved);

        // Stage 3: generation, temperature pinned for determinism.
        let generation_response = self
            .llm
            .generate(
                &self.llm_config.with_temperature(0.0),
                &self.prompts.generation_prompt(&schema_description),
                user_query,
            )
            .await?;

        // Stage 4: fence extraction, terminal.
        let sql = extract_sql(&generation_response)?;
        info!(query_hash = %query_hash, "SQL extracted");

        Ok(GeneratedSql {
            sql,
            resolved_schema: resolved,
        })
    }
}
