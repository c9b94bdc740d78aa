pub mod executor;

pub use executor::{strip_rowid_columns, SqlExecutor, UnconfiguredExecutor};
