//! Validation errors for ingestion payloads and statistics queries.
//!
//! Every variant is a client error: it is reported back unchanged, never
//! retried, and is raised before anything touches the database.

use thiserror::Error;

/// Highest severity number defined by the OpenTelemetry log data model.
pub const MAX_SEVERITY_NUMBER: i64 = 24;

/// Maximum length of a caller-supplied log id.
pub const MAX_ID_LEN: usize = 128;

/// Earliest year the statistics pages accept.
pub const MIN_STATS_YEAR: i32 = 2000;

/// Latest year the statistics pages accept (timestamps are four-digit text).
pub const MAX_STATS_YEAR: i32 = 9999;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Malformed log payload: {0}")]
    MalformedPayload(String),

    #[error("severity_text must not be empty")]
    MissingSeverity,

    #[error("Invalid severity_number {0}. Valid range: 0..=24")]
    InvalidSeverityNumber(i64),

    #[error("id is {0} characters long; at most 128 are allowed")]
    IdTooLong(usize),

    #[error("Attribute keys must not be empty")]
    EmptyAttributeKey,

    #[error("Invalid year: '{0}'. Valid range: 2000..=9999")]
    InvalidYear(String),

    #[error("Invalid month: '{0}'. Valid range: 1..=12")]
    InvalidMonth(String),
}

/// Validate a severity number
///
/// # Examples
/// ```
/// use db::validation::validate_severity_number;
///
/// assert!(validate_severity_number(9).is_ok());
/// assert!(validate_severity_number(25).is_err());
/// ```
pub fn validate_severity_number(number: i64) -> Result<(), ValidationError> {
    if (0..=MAX_SEVERITY_NUMBER).contains(&number) {
        Ok(())
    } else {
        Err(ValidationError::InvalidSeverityNumber(number))
    }
}

pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    let len = id.chars().count();
    if len > MAX_ID_LEN {
        Err(ValidationError::IdTooLong(len))
    } else {
        Ok(())
    }
}

/// Parse a `year` query value.
pub fn parse_year(raw: &str) -> Result<i32, ValidationError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|y| (MIN_STATS_YEAR..=MAX_STATS_YEAR).contains(y))
        .ok_or_else(|| ValidationError::InvalidYear(raw.to_string()))
}

/// Parse a `month` query value.
pub fn parse_month(raw: &str) -> Result<u32, ValidationError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| ValidationError::InvalidMonth(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_number_bounds() {
        assert!(validate_severity_number(0).is_ok());
        assert!(validate_severity_number(24).is_ok());
        assert_eq!(
            validate_severity_number(-1),
            Err(ValidationError::InvalidSeverityNumber(-1))
        );
        assert_eq!(
            validate_severity_number(25),
            Err(ValidationError::InvalidSeverityNumber(25))
        );
    }

    #[test]
    fn test_id_length_counts_chars() {
        assert!(validate_id(&"a".repeat(128)).is_ok());
        assert_eq!(
            validate_id(&"a".repeat(129)),
            Err(ValidationError::IdTooLong(129))
        );
        // 128 multi-byte characters are still 128 characters
        assert!(validate_id(&"é".repeat(128)).is_ok());
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2024"), Ok(2024));
        assert_eq!(parse_year(" 2000 "), Ok(2000));
        assert!(matches!(
            parse_year("1999"),
            Err(ValidationError::InvalidYear(_))
        ));
        assert!(matches!(
            parse_year("twenty"),
            Err(ValidationError::InvalidYear(_))
        ));
        assert!(matches!(
            parse_year("10000"),
            Err(ValidationError::InvalidYear(_))
        ));
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("1"), Ok(1));
        assert_eq!(parse_month("12"), Ok(12));
        assert!(matches!(
            parse_month("13"),
            Err(ValidationError::InvalidMonth(_))
        ));
        assert!(matches!(
            parse_month("-1"),
            Err(ValidationError::InvalidMonth(_))
        ));
    }
}
