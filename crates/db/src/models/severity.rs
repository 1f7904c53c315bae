//! Severity levels and their OpenTelemetry base ranks.

/// Known severity names with the lowest number of their OpenTelemetry range.
pub const KNOWN_SEVERITIES: &[(&str, i64)] = &[
    ("TRACE", 1),
    ("DEBUG", 5),
    ("INFO", 9),
    ("WARN", 13),
    ("ERROR", 17),
    ("FATAL", 21),
];

/// Rank for an ingested `severity_text` when the payload has no number.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
/// `WARNING` is accepted as `WARN`. Unknown text ranks 0 (unspecified).
pub fn severity_number_for(text: &str) -> i64 {
    let upper = text.trim().to_ascii_uppercase();
    let name = match upper.as_str() {
        "WARNING" => "WARN",
        other => other,
    };
    KNOWN_SEVERITIES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, number)| *number)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_levels() {
        assert_eq!(severity_number_for("TRACE"), 1);
        assert_eq!(severity_number_for("info"), 9);
        assert_eq!(severity_number_for(" Error "), 17);
        assert_eq!(severity_number_for("FATAL"), 21);
    }

    #[test]
    fn test_warning_alias() {
        assert_eq!(severity_number_for("WARNING"), 13);
        assert_eq!(severity_number_for("warn"), 13);
    }

    #[test]
    fn test_unknown_is_unspecified() {
        assert_eq!(severity_number_for("NOTICE"), 0);
        assert_eq!(severity_number_for(""), 0);
    }
}
