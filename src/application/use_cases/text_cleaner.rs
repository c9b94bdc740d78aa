use once_cell::sync::Lazy;
use regex::Regex;

static NON_KEY_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_]").unwrap());

/// Reduce raw text to the key form used for every embedding call: lowercase
/// first, then strip everything outside [a-z0-9_].
///
/// Embeddings are sensitive to casing and punctuation, so the same cleaning
/// must run on both sides of any cosine comparison. Every embed call in this
/// crate goes through this function; nothing re-implements it.
pub fn normalize_key(text: &str) -> String {
    NON_KEY_CHARS
        .replace_all(&text.to_lowercase(), "")
        .into_owned()
}
