use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Short stable hash used to correlate one request's log lines without
/// putting raw query text in the logs.
pub fn hash_query(query: &str) -> String {
    let normalized = query.to_lowercase().trim().to_string();
    let mut hasher = DefaultHasher::new();
    normalized.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_case_insensitive() {
        assert_eq!(hash_query("Show Inquiries"), hash_query("show inquiries "));
        assert_ne!(hash_query("a"), hash_query("b"));
    }
}
