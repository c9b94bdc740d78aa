//! Startup wiring: load the snapshot and verified-query log, build the
//! indexes, and assemble the request-handling state.

use crate::application::use_cases::embedding_service::{EmbeddingProvider, EmbeddingService};
use crate::application::use_cases::prompt_builder::PromptBuilder;
use crate::application::use_cases::query_pipeline::QueryPipeline;
use crate::application::use_cases::retriever::QueryRetriever;
use crate::application::use_cases::schema_index::SchemaIndex;
use crate::application::use_cases::schema_resolver::SchemaResolver;
use crate::application::use_cases::verified_queries::{VerificationRecorder, VerifiedQueryIndex};
use crate::domain::error::Result;
use crate::infrastructure::config::Settings;
use crate::infrastructure::db::UnconfiguredExecutor;
use crate::infrastructure::llm_clients::{LLMClient, RouterClient};
use crate::infrastructure::persistence::export::CsvExporter;
use crate::infrastructure::persistence::snapshot::load_schema_snapshot;
use crate::infrastructure::persistence::verified_log::JsonlVerifiedLog;
use crate::interfaces::http::{AppState, ExportStore, EXPORT_STORE_CAPACITY};
use std::sync::{Arc, Mutex};
use tracing::info;

pub async fn build_state(settings: &Settings) -> Result<Arc<AppState>> {
    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(EmbeddingService::new(settings.embedding.clone()));

    let snapshot = load_schema_snapshot(&settings.storage.snapshot_path)?;
    let schema = Arc::new(SchemaIndex::build(snapshot, embedder.as_ref()).await?);

    let log = Arc::new(JsonlVerifiedLog::new(&settings.storage.verified_log_path));
    let verified = Arc::new(VerifiedQueryIndex::new(log.load()?));
    info!(verified = verified.len(), "Verified-query index ready");

    let llm: Arc<dyn LLMClient> = Arc::new(RouterClient::new());

    let pipeline = QueryPipeline::new(
        QueryRetriever::new(verified.clone(), embedder.clone()),
        SchemaResolver::new(schema, embedder.clone()),
        PromptBuilder::new(settings.retrieval.schema_owner.clone()),
        llm,
        settings.chat.clone(),
        settings.retrieval.top_n,
    );
    let recorder = VerificationRecorder::new(verified, log, embedder);

    Ok(Arc::new(AppState {
        pipeline,
        recorder,
        executor: Arc::new(UnconfiguredExecutor),
        exporter: CsvExporter::new(&settings.storage.export_dir),
        exports: Mutex::new(ExportStore::new(EXPORT_STORE_CAPACITY)),
    }))
}
