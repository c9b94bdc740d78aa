//! Extraction of the SQL statement from the generation LLM's fenced output.
//!
//! The interior between the first and last triple-backtick fence is taken,
//! the `sql` language tag dropped, and the text flattened to a single line
//! with trailing semicolons removed. Missing or degenerate fences are an
//! explicit error; this function never hands back sliced garbage.

use crate::domain::error::{AppError, Result};

const FENCE: &str = "```";

pub fn extract_sql(response: &str) -> Result<String> {
    let open = response.find(FENCE).ok_or_else(|| {
        AppError::ExtractionFormat("No code fence found in generation response".to_string())
    })?;
    let close = response.rfind(FENCE).unwrap_or(open);

    if close < open + FENCE.len() {
        return Err(AppError::ExtractionFormat(
            "Unterminated code fence in generation response".to_string(),
        ));
    }

    let mut interior = response[open + FENCE.len()..close].trim();
    interior = interior.strip_prefix("sql").unwrap_or(interior);

    let flattened = interior
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let sql = flattened
        .trim_end_matches(';')
        .replace("\\'", "'")
        .trim()
        .to_string();

    if sql.is_empty() {
        return Err(AppError::ExtractionFormat(
            "Code fence contained no SQL".to_string(),
        ));
    }

    Ok(sql)
}
