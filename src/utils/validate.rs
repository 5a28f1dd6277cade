//! Query text validation.
//!
//! Query text is forwarded verbatim into provider URLs and query languages,
//! so anything that looks like shell, SQL or markup injection is rejected
//! before it reaches a backend.

use thiserror::Error;

/// Maximum accepted query length in characters
pub const MAX_QUERY_LENGTH: usize = 500;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error("Query is longer than {MAX_QUERY_LENGTH} characters")]
    QueryTooLong,

    #[error("Query contains control characters")]
    ControlCharacters,

    #[error("Query contains disallowed character: {0}")]
    DisallowedCharacter(char),

    #[error("Query contains a disallowed pattern: {0}")]
    InjectionPattern(String),
}

const DISALLOWED_CHARS: [char; 7] = [';', '|', '`', '$', '<', '>', '\\'];

const INJECTION_PATTERNS: [&str; 9] = [
    "--",
    "/*",
    "*/",
    "&&",
    "drop table",
    "union select",
    "insert into",
    "javascript:",
    "../",
];

/// Validate query text before it is passed to a provider
///
/// Returns the trimmed query with internal whitespace collapsed.
pub fn validate_query(query: &str) -> Result<String, ValidationError> {
    let query = query.trim();

    if query.is_empty() {
        return Err(ValidationError::EmptyQuery);
    }

    if query.chars().count() > MAX_QUERY_LENGTH {
        return Err(ValidationError::QueryTooLong);
    }

    if query.chars().any(|c| c.is_control() && c != '\t' && c != '\n') {
        return Err(ValidationError::ControlCharacters);
    }

    if let Some(ch) = query.chars().find(|c| DISALLOWED_CHARS.contains(c)) {
        return Err(ValidationError::DisallowedCharacter(ch));
    }

    let lowered = query.to_lowercase();
    if let Some(pattern) = INJECTION_PATTERNS.iter().find(|p| lowered.contains(*p)) {
        return Err(ValidationError::InjectionPattern(pattern.to_string()));
    }

    Ok(query.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_query_valid() {
        assert_eq!(validate_query("large language models").unwrap(), "large language models");
        assert_eq!(validate_query("  cat:cs.AI   AND  rag ").unwrap(), "cat:cs.AI AND rag");
        assert!(validate_query("\"retrieval augmented\" (survey)").is_ok());
        assert!(validate_query("fine-tuning").is_ok());
    }

    #[test]
    fn test_validate_query_empty() {
        assert_eq!(validate_query(""), Err(ValidationError::EmptyQuery));
        assert_eq!(validate_query("   "), Err(ValidationError::EmptyQuery));
    }

    #[test]
    fn test_validate_query_too_long() {
        let long = "a".repeat(MAX_QUERY_LENGTH + 1);
        assert_eq!(validate_query(&long), Err(ValidationError::QueryTooLong));
    }

    #[test]
    fn test_validate_query_dangerous() {
        assert_eq!(
            validate_query("foo; rm -rf /"),
            Err(ValidationError::DisallowedCharacter(';'))
        );
        assert!(validate_query("foo`ls`").is_err());
        assert!(validate_query("x' UNION SELECT password").is_err());
        assert!(validate_query("<script>alert(1)</script>").is_err());
        assert!(validate_query("a -- comment").is_err());
        assert!(validate_query("null\0byte").is_err());
    }
}
