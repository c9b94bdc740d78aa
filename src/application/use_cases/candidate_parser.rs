//! Parser for the table-extraction LLM response.
//!
//! Expected shape, one labeled line each (order free, labels case
//! insensitive):
//!
//! ```text
//! Tables: Product Inquiries, MIR
//! Amount of Tables: 2
//! Columns: CIC, Timeliness Determined Late, Date Opened
//! Amount of Columns: 3
//! ```
//!
//! The counts are the model's self-report. They are kept as advisory hints
//! and never validated against the parsed list lengths; a malformed count
//! parses as zero. A response with no recognizable label at all is a grammar
//! mismatch and an explicit parse error.

use crate::domain::entities::CandidateExtraction;
use crate::domain::error::{AppError, Result};

pub fn parse_candidates(response: &str) -> Result<CandidateExtraction> {
    let mut table_names: Option<Vec<String>> = None;
    let mut table_count: usize = 0;
    let mut column_names: Option<Vec<String>> = None;
    let mut column_count: usize = 0;

    for line in response.lines() {
        let line = line.trim();
        if let Some(value) = label_value(line, "amount of tables:") {
            table_count = value.parse().unwrap_or(0);
        } else if let Some(value) = label_value(line, "amount of columns:") {
            column_count = value.parse().unwrap_or(0);
        } else if let Some(value) = label_value(line, "tables:") {
            table_names = Some(split_names(value));
        } else if let Some(value) = label_value(line, "columns:") {
            column_names = Some(split_names(value));
        }
    }

    if table_names.is_none() && column_names.is_none() {
        return Err(AppError::ParseError(format!(
            "No table or column labels found in extraction response: {:?}",
            truncate(response, 120)
        )));
    }

    Ok(CandidateExtraction {
        table_names: table_names.unwrap_or_default(),
        table_count,
        column_names: column_names.unwrap_or_default(),
        column_count,
    })
}

fn label_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let prefix = line.get(..label.len())?;
    if prefix.eq_ignore_ascii_case(label) {
        Some(line[label.len()..].trim())
    } else {
        None
    }
}

fn split_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|name| name.trim().trim_matches('"').trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_well_formed_response() {
        let response = "Tables: Product Inquiries, MIR\n\
                        Amount of Tables: 2\n\
                        Columns: CIC, Timeliness Determined Late, Date Opened\n\
                        Amount of Columns: 3";

        let extraction = parse_candidates(response).unwrap();
        assert_eq!(extraction.table_names, vec!["Product Inquiries", "MIR"]);
        assert_eq!(extraction.table_count, 2);
        assert_eq!(
            extraction.column_names,
            vec!["CIC", "Timeliness Determined Late", "Date Opened"]
        );
        assert_eq!(extraction.column_count, 3);
    }

    #[test]
    fn test_counts_are_advisory_and_may_mismatch() {
        let response = "Tables: Product Inquiries\n\
                        Amount of Tables: 5\n\
                        Columns: CIC\n\
                        Amount of Columns: zero";

        let extraction = parse_candidates(response).unwrap();
        assert_eq!(extraction.table_names.len(), 1);
        assert_eq!(extraction.table_count, 5);
        assert_eq!(extraction.column_count, 0);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let response = "Tables: MIR";
        let extraction = parse_candidates(response).unwrap();
        assert_eq!(extraction.table_names, vec!["MIR"]);
        assert_eq!(extraction.table_count, 0);
        assert!(extraction.column_names.is_empty());
    }

    #[test]
    fn test_labels_are_case_insensitive_and_quoted_names_unwrapped() {
        let response = "tables: \"Product Inquiries\" , MIR\ncolumns: \"Date Opened\"";
        let extraction = parse_candidates(response).unwrap();
        assert_eq!(extraction.table_names, vec!["Product Inquiries", "MIR"]);
        assert_eq!(extraction.column_names, vec!["Date Opened"]);
    }

    #[test]
    fn test_no_labels_is_a_parse_error() {
        let response = "I could not find any relevant tables for this question.";
        let err = parse_candidates(response).unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }
}
