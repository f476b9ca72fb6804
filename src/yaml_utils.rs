//! YAML utilities for session metadata preprocessing.
//!
//! The simulator's metadata document has several non-standard issues that
//! need correction before a YAML parser will accept it:
//! - Unescaped special characters in free-text values (names, file paths)
//! - Control characters that break YAML parsers
//! - Inconsistent string quoting
//!
//! This module provides low-level cleaning without parsing.

use crate::{Result, TelemetryError};

/// Keys whose values contain uncontrolled free text and need quoting.
const PROBLEMATIC_KEYS: &[&str] =
    &["AbbrevName:", "TeamName:", "UserName:", "Initials:", "CarDesignStr:"];

/// Extract the metadata text from the raw byte span.
///
/// The span may be padded past a null terminator; everything from the first
/// null onward is discarded. Invalid UTF-8 sequences are replaced rather
/// than rejected.
pub fn extract_metadata_text(span: &[u8]) -> String {
    let text_len = span.iter().position(|&b| b == 0).unwrap_or(span.len());
    String::from_utf8_lossy(&span[..text_len]).to_string()
}

/// Preprocess the metadata document into parseable YAML.
///
/// Strips control characters (keeping `\n`, `\r`, `\t`) and single-quotes
/// the values of keys known to carry unescaped free text.
pub fn preprocess_metadata_yaml(text: &str) -> Result<String> {
    let mut cleaned = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_control() && ch != '\n' && ch != '\r' && ch != '\t' {
            continue;
        }
        cleaned.push(ch);
    }

    let lines: Vec<&str> = cleaned.lines().collect();
    let mut result_lines = Vec::with_capacity(lines.len());

    for line in lines {
        let mut processed_line = line.to_string();

        for &key in PROBLEMATIC_KEYS {
            if let Some(colon_pos) = line.find(key) {
                let after_colon = colon_pos + key.len();
                if let Some(value_start) = line[after_colon..].find(|c: char| !c.is_whitespace()) {
                    let actual_value_start = after_colon + value_start;
                    let value = line[actual_value_start..].trim();

                    if !value.is_empty() && !value.starts_with('\'') && !value.starts_with('"') {
                        let escaped_value = value.replace('\'', "''");
                        processed_line = format!(
                            "{}{} '{}'",
                            &line[..after_colon],
                            &line[after_colon..actual_value_start],
                            escaped_value
                        );
                    }
                }
                break; // Only the first matching key per line
            }
        }

        result_lines.push(processed_line);
    }

    let result = result_lines.join("\n");

    if result.trim().is_empty() {
        return Err(TelemetryError::parse(
            "Metadata preprocessing",
            "Document is empty after preprocessing",
        ));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_control_characters() {
        let input = "WeekendInfo:\n\x00\x01\x02  TrackName: test\x03";
        let result = preprocess_metadata_yaml(input).unwrap();
        assert!(!result.contains('\x00'));
        assert!(!result.contains('\x01'));
        assert!(result.contains("WeekendInfo"));
        assert!(result.contains("TrackName"));
    }

    #[test]
    fn keeps_valid_whitespace() {
        let input = "Key:\n\t  Value";
        let result = preprocess_metadata_yaml(input).unwrap();
        assert!(result.contains('\n'));
        assert!(result.contains('\t'));
    }

    #[test]
    fn quotes_problematic_values() {
        let input = "UserName: O'Connor, Mike";
        let result = preprocess_metadata_yaml(input).unwrap();
        assert_eq!(result, "UserName: 'O''Connor, Mike'");
    }

    #[test]
    fn leaves_already_quoted_values_alone() {
        let input = "UserName: 'Quoted'";
        let result = preprocess_metadata_yaml(input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn extract_stops_at_null_terminator() {
        let span = b"SessionInfo:\n  Laps: 5\0padding";
        assert_eq!(extract_metadata_text(span), "SessionInfo:\n  Laps: 5");
    }

    #[test]
    fn extract_without_null_uses_full_span() {
        let span = b"SessionInfo:\n  Laps: 5";
        assert_eq!(extract_metadata_text(span), "SessionInfo:\n  Laps: 5");
    }

    #[test]
    fn empty_document_is_an_error() {
        assert!(preprocess_metadata_yaml("\x00\x01").is_err());
    }
}
