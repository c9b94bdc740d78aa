pub mod use_cases;

pub use use_cases::query_pipeline::{GeneratedSql, QueryPipeline};
pub use use_cases::retriever::QueryRetriever;
pub use use_cases::schema_index::SchemaIndex;
pub use use_cases::schema_resolver::SchemaResolver;
pub use use_cases::verified_queries::{VerificationRecorder, VerifiedQueryIndex, VerifyOutcome};
