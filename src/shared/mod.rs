pub mod query_hash;
