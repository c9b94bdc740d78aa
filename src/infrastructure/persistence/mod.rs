pub mod export;
pub mod snapshot;
pub mod verified_log;
